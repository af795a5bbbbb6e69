//! The Genloom engine — capability-aware generation orchestration.
//!
//! Request flow:
//!
//! 1. **Orchestrator** resolves the active model, fetches (or reuses a
//!    cached) project-context snapshot, and pulls budget-trimmed history
//!    from the Conversation Store
//! 2. **Router** resolves the model's capability tier, adjusts the request
//!    to fit (token ceiling clamp, streaming downgrade), and dispatches to
//!    the tier's strategy
//! 3. The **Strategy** executes — single shot, buffered stream, or bounded
//!    tool loop — and parses the response into code artifacts
//! 4. The Orchestrator commits conversation turns, runs an optional
//!    post-hoc output check, and emits a metrics record either way
//!
//! Everything is dependency-injected: no global registries, no singletons.

pub mod context_cache;
pub mod orchestrator;
pub mod router;

pub use context_cache::ContextCache;
pub use orchestrator::{GenerateOptions, HealthReport, Orchestrator};
pub use router::Router;
