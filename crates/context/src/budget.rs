//! Per-model context budgets.
//!
//! A budget caps every context segment (system prompt, project context,
//! conversation history) so the assembled prompt stays within a model's
//! input limits. Budgets are derived from the capability ceiling per call
//! and never persisted.

use genloom_core::capability::ModelCapabilities;
use serde::{Deserialize, Serialize};

/// How much detail the prompt should carry for the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailMode {
    /// Bare minimum: names only, single-turn history
    Minimal,
    /// Component names plus exports, short history
    Essential,
    /// Everything the analyzer found
    Full,
}

/// Token ceilings for the context segments of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBudget {
    /// Ceiling for the system prompt
    pub max_system_prompt_tokens: usize,

    /// Ceiling for the rendered project context
    pub max_project_context_tokens: usize,

    /// Ceiling for conversation history
    pub max_history_tokens: usize,

    /// Maximum referenced components in the context rendering
    pub components_limit: usize,

    /// Maximum history turns handed to the strategy
    pub history_turn_limit: usize,

    /// Detail mode for context rendering
    pub detail_mode: DetailMode,
}

/// Ceilings at or below this get the ultra-minimal budget.
const LOW_CEILING: u32 = 2_048;
/// Ceilings at or below this (and above `LOW_CEILING`) get the mid budget.
const MID_CEILING: u32 = 8_192;

/// Computes per-model budgets via static tiered rules.
///
/// Stateless — construct once and reuse.
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetPlanner;

impl BudgetPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Compute the budget for a model given its capabilities.
    pub fn budget_for(&self, caps: &ModelCapabilities) -> ContextBudget {
        if caps.max_output_tokens <= LOW_CEILING {
            // Ultra-minimal: the model can barely fit instructions and one
            // turn of history.
            ContextBudget {
                max_system_prompt_tokens: 100,
                max_project_context_tokens: 3_000,
                max_history_tokens: 400,
                components_limit: 3,
                history_turn_limit: 1,
                detail_mode: DetailMode::Minimal,
            }
        } else if caps.max_output_tokens <= MID_CEILING {
            ContextBudget {
                max_system_prompt_tokens: 400,
                max_project_context_tokens: 8_000,
                max_history_tokens: 2_000,
                components_limit: 8,
                history_turn_limit: 6,
                detail_mode: DetailMode::Essential,
            }
        } else {
            ContextBudget {
                max_system_prompt_tokens: 1_000,
                max_project_context_tokens: 16_000,
                max_history_tokens: 6_000,
                components_limit: 20,
                history_turn_limit: 12,
                detail_mode: DetailMode::Full,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genloom_core::capability::{CapabilityTable, ModelCapabilities};

    fn caps_with_ceiling(ceiling: u32) -> ModelCapabilities {
        let mut caps = ModelCapabilities::conservative("test-model");
        caps.max_output_tokens = ceiling;
        caps
    }

    #[test]
    fn low_ceiling_gets_minimal_budget() {
        let budget = BudgetPlanner::new().budget_for(&caps_with_ceiling(1024));
        assert_eq!(budget.history_turn_limit, 1);
        assert_eq!(budget.components_limit, 3);
        assert_eq!(budget.detail_mode, DetailMode::Minimal);
        assert_eq!(budget.max_system_prompt_tokens, 100);
    }

    #[test]
    fn mid_ceiling_gets_essential_budget() {
        let budget = BudgetPlanner::new().budget_for(&caps_with_ceiling(4096));
        assert_eq!(budget.detail_mode, DetailMode::Essential);
        assert_eq!(budget.history_turn_limit, 6);
    }

    #[test]
    fn high_ceiling_gets_full_budget() {
        let budget = BudgetPlanner::new().budget_for(&caps_with_ceiling(16_384));
        assert_eq!(budget.detail_mode, DetailMode::Full);
        assert_eq!(budget.components_limit, 20);
    }

    #[test]
    fn low_budget_strictly_smaller_than_high() {
        let planner = BudgetPlanner::new();
        let low = planner.budget_for(&caps_with_ceiling(1024));
        let high = planner.budget_for(&caps_with_ceiling(32_768));

        assert!(low.max_system_prompt_tokens < high.max_system_prompt_tokens);
        assert!(low.max_project_context_tokens < high.max_project_context_tokens);
        assert!(low.max_history_tokens < high.max_history_tokens);
        assert!(low.components_limit < high.components_limit);
        assert!(low.history_turn_limit < high.history_turn_limit);
    }

    #[test]
    fn unknown_model_resolves_to_minimal_budget() {
        let table = CapabilityTable::with_defaults();
        let caps = table.get("no-such-model");
        let budget = BudgetPlanner::new().budget_for(&caps);
        assert_eq!(budget.detail_mode, DetailMode::Minimal);
        assert_eq!(budget.history_turn_limit, 1);
    }

    #[test]
    fn budget_is_recomputed_not_cached() {
        let planner = BudgetPlanner::new();
        let a = planner.budget_for(&caps_with_ceiling(1024));
        let b = planner.budget_for(&caps_with_ceiling(1024));
        assert_eq!(a, b);
    }
}
