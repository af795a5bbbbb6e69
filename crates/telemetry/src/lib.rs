//! Telemetry for Genloom — one metrics record per generation call.
//!
//! The orchestrator emits a [`GenerationRecord`] on every call, success or
//! failure, through the [`MetricsSink`] trait. [`TelemetryEngine`] is the
//! built-in sink: an in-memory, capped recorder with aggregation queries.

pub mod engine;
pub mod record;

pub use engine::{MetricsSink, TelemetryEngine};
pub use record::{GenerationRecord, ModelUsage, TelemetrySummary};
