//! Thread-safe telemetry engine — collects generation records and serves
//! usage summaries.

use crate::record::{GenerationRecord, ModelUsage, TelemetrySummary};
use std::collections::HashMap;
use std::sync::RwLock;

/// A sink for generation records.
///
/// The orchestrator emits through this trait so tests can capture records
/// without a full engine.
pub trait MetricsSink: Send + Sync {
    fn record(&self, record: GenerationRecord);
}

/// Retained records cap; the oldest tenth is pruned when it is hit.
const MAX_RECORDS: usize = 5_000;

/// The core telemetry engine.
///
/// Thread-safe via `RwLock`. Records are kept most recent last, pruned
/// oldest-first at capacity.
pub struct TelemetryEngine {
    records: RwLock<Vec<GenerationRecord>>,
    capacity: usize,
}

impl TelemetryEngine {
    pub fn new() -> Self {
        Self::with_capacity(MAX_RECORDS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    /// Number of retained records.
    pub fn count(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// The most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<GenerationRecord> {
        let records = self.records.read().unwrap();
        records.iter().rev().take(limit).cloned().collect()
    }

    /// Aggregate everything currently retained.
    pub fn summary(&self) -> TelemetrySummary {
        let records = self.records.read().unwrap();

        let mut successes = 0u64;
        let mut failures = 0u64;
        let mut total_tokens = 0u64;
        let mut total_files = 0u64;
        let mut by_model: HashMap<String, (u64, u64)> = HashMap::new();

        for record in records.iter() {
            if record.success {
                successes += 1;
            } else {
                failures += 1;
            }
            let tokens = record.tokens_used.unwrap_or(0) as u64;
            total_tokens += tokens;
            total_files += record.file_count as u64;

            let entry = by_model.entry(record.model.clone()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += tokens;
        }

        let mut by_model: Vec<ModelUsage> = by_model
            .into_iter()
            .map(|(model, (calls, tokens))| ModelUsage {
                model,
                calls,
                tokens,
            })
            .collect();
        by_model.sort_by(|a, b| b.calls.cmp(&a.calls));

        TelemetrySummary {
            total: successes + failures,
            successes,
            failures,
            total_tokens,
            total_files,
            by_model,
        }
    }
}

impl MetricsSink for TelemetryEngine {
    fn record(&self, record: GenerationRecord) {
        tracing::debug!(
            model = %record.model,
            success = record.success,
            strategy = %record.strategy,
            "Generation recorded"
        );

        let mut records = self.records.write().unwrap();
        if records.len() >= self.capacity {
            let drain = (self.capacity / 10).max(1);
            records.drain(..drain);
        }
        records.push(record);
    }
}

impl Default for TelemetryEngine {
    fn default() -> Self {
        Self::new()
    }
}
