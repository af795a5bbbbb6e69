//! Data model for per-generation metrics records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One record per generation call, emitted regardless of outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// Unique identifier.
    pub id: String,
    /// When the generation completed.
    pub timestamp: DateTime<Utc>,
    /// Whether the call produced a successful result.
    pub success: bool,
    /// Which model was used.
    pub model: String,
    /// Capability tier the request was routed to.
    pub tier: String,
    /// Which strategy executed ("core" / "enhanced").
    pub strategy: String,
    /// Total tokens consumed, when the provider reported usage.
    pub tokens_used: Option<u32>,
    /// How many file specs the result carried.
    pub file_count: usize,
    /// Tool-loop steps consumed, when the tool loop ran.
    pub steps_used: Option<u32>,
    /// The error message on failure.
    pub error: Option<String>,
}

impl GenerationRecord {
    /// Create a record with a fresh id and the current timestamp.
    pub fn new(success: bool, model: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            success,
            model: model.into(),
            tier: String::new(),
            strategy: String::new(),
            tokens_used: None,
            file_count: 0,
            steps_used: None,
            error: None,
        }
    }

    pub fn with_tier(mut self, tier: impl Into<String>) -> Self {
        self.tier = tier.into();
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into();
        self
    }

    pub fn with_tokens(mut self, tokens: Option<u32>) -> Self {
        self.tokens_used = tokens;
        self
    }

    pub fn with_files(mut self, count: usize) -> Self {
        self.file_count = count;
        self
    }

    pub fn with_steps(mut self, steps: Option<u32>) -> Self {
        self.steps_used = steps;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Aggregated usage for one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelUsage {
    pub model: String,
    pub calls: u64,
    pub tokens: u64,
}

/// A summary over all retained records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySummary {
    pub total: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_tokens: u64,
    pub total_files: u64,
    /// Per-model usage, most-called first.
    pub by_model: Vec<ModelUsage>,
}
