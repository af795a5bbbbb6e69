//! Model capability registry — what each model can actually do.
//!
//! Capabilities drive every downstream decision: which generation strategy
//! runs, how large the context budget is, and whether streaming or
//! tool-calling can be used at all. Lookups never fail — unknown models
//! resolve to a conservative default so a misconfigured model id degrades
//! instead of crashing.

use serde::{Deserialize, Serialize};

/// Coarse capability class a model belongs to.
///
/// The tier selects a generation strategy: `Core` models get the
/// single-prompt degraded path, `Enhanced` models get streaming and the
/// tool-calling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Core,
    Enhanced,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core => write!(f, "core"),
            Self::Enhanced => write!(f, "enhanced"),
        }
    }
}

/// The capability set of a single model. Immutable configuration data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCapabilities {
    /// The model identifier this entry describes.
    pub model_id: String,

    /// Whether the model supports incremental token streaming.
    pub supports_streaming: bool,

    /// Whether the model supports tool/function calling.
    pub supports_tool_calls: bool,

    /// Whether the model supports structured (schema-constrained) output.
    pub supports_structured_output: bool,

    /// Maximum tokens the model can emit in one response.
    pub max_output_tokens: u32,

    /// Capability tier used for strategy selection.
    pub tier: Tier,
}

impl ModelCapabilities {
    /// The conservative default used for unknown model ids:
    /// core tier, no advanced features, low ceiling.
    pub fn conservative(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            supports_streaming: false,
            supports_tool_calls: false,
            supports_structured_output: false,
            max_output_tokens: 1024,
            tier: Tier::Core,
        }
    }
}

/// Normalize a model id for matching: lowercase, trimmed.
fn normalize(model_id: &str) -> String {
    model_id.trim().to_lowercase()
}

/// A registry entry. A Vec of entries (longest prefix first) instead of a
/// HashMap so date-suffixed ids like `gpt-4o-2024-08-06` resolve to their
/// family entry via prefix match.
struct TableEntry {
    prefix: String,
    caps: ModelCapabilities,
}

/// Static registry mapping model ids to capability sets.
///
/// Explicitly constructed — no global singleton. `with_defaults()` seeds
/// the well-known model families; `register()` adds or overrides entries.
pub struct CapabilityTable {
    entries: Vec<TableEntry>,
}

impl CapabilityTable {
    /// Create an empty table. Every lookup falls back to the conservative
    /// default until entries are registered.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// A table seeded with well-known model families.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();

        // Enhanced tier: streaming + tools + structured output.
        table.register(ModelCapabilities {
            model_id: "claude-sonnet-4".into(),
            supports_streaming: true,
            supports_tool_calls: true,
            supports_structured_output: true,
            max_output_tokens: 16_384,
            tier: Tier::Enhanced,
        });
        table.register(ModelCapabilities {
            model_id: "claude-haiku-3".into(),
            supports_streaming: true,
            supports_tool_calls: true,
            supports_structured_output: false,
            max_output_tokens: 4_096,
            tier: Tier::Enhanced,
        });
        table.register(ModelCapabilities {
            model_id: "gpt-4o".into(),
            supports_streaming: true,
            supports_tool_calls: true,
            supports_structured_output: true,
            max_output_tokens: 16_384,
            tier: Tier::Enhanced,
        });
        table.register(ModelCapabilities {
            model_id: "gpt-4-turbo".into(),
            supports_streaming: true,
            supports_tool_calls: true,
            supports_structured_output: false,
            max_output_tokens: 4_096,
            tier: Tier::Enhanced,
        });

        // Core tier: legacy or constrained models.
        table.register(ModelCapabilities {
            model_id: "gpt-3.5-turbo".into(),
            supports_streaming: true,
            supports_tool_calls: false,
            supports_structured_output: false,
            max_output_tokens: 4_096,
            tier: Tier::Core,
        });
        table.register(ModelCapabilities {
            model_id: "llama-3-8b".into(),
            supports_streaming: false,
            supports_tool_calls: false,
            supports_structured_output: false,
            max_output_tokens: 2_048,
            tier: Tier::Core,
        });
        table.register(ModelCapabilities {
            model_id: "phi-3-mini".into(),
            supports_streaming: false,
            supports_tool_calls: false,
            supports_structured_output: false,
            max_output_tokens: 1_024,
            tier: Tier::Core,
        });

        table
    }

    /// Register a capability entry. Re-registering the same model id
    /// replaces the previous entry.
    pub fn register(&mut self, caps: ModelCapabilities) {
        let prefix = normalize(&caps.model_id);
        self.entries.retain(|e| e.prefix != prefix);
        self.entries.push(TableEntry { prefix, caps });
        // Longest prefix first so the most specific family wins.
        self.entries.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
    }

    /// Look up capabilities for a model id. Never fails: exact match, then
    /// prefix match, then the conservative default.
    pub fn get(&self, model_id: &str) -> ModelCapabilities {
        let norm = normalize(model_id);

        if let Some(entry) = self.entries.iter().find(|e| e.prefix == norm) {
            return entry.caps.clone();
        }
        if let Some(entry) = self.entries.iter().find(|e| norm.starts_with(&e.prefix)) {
            let mut caps = entry.caps.clone();
            caps.model_id = model_id.to_string();
            return caps;
        }

        tracing::debug!(model = %model_id, "Unknown model, using conservative capabilities");
        ModelCapabilities::conservative(model_id)
    }

    /// Resolve just the tier for a model id.
    pub fn tier_of(&self, model_id: &str) -> Tier {
        self.get(model_id).tier
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}
