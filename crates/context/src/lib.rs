//! Context budget planning for Genloom.
//!
//! Two concerns live here:
//!
//! 1. **Budgets** — per-model token ceilings for the system prompt,
//!    project context, and conversation history, derived from the
//!    capability table's output ceiling.
//! 2. **Tokens** — the character-ratio estimation heuristic and
//!    boundary-aware truncation used to fit text into those budgets.

pub mod budget;
pub mod token;

pub use budget::{BudgetPlanner, ContextBudget, DetailMode};
pub use token::{CHARS_PER_TOKEN, TRUNCATION_MARKER, estimate_tokens, truncate_to_budget};
