//! Generation request and result value objects.
//!
//! One `GenerationRequest` and one `GenerationResult` exist per call,
//! owned by the call stack that created them. The success/error invariant
//! is enforced by the constructors: a failure has empty content and an
//! error message, a success never carries an error.

use crate::analyzer::ProjectContext;
use crate::artifact::{CodeArtifact, FileSpec};
use crate::capability::Tier;
use crate::message::HistoryTurn;
use crate::tool::ToolOutcome;
use serde::{Deserialize, Serialize};

/// Per-request generation options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Maximum tokens to generate (clamped to the model ceiling by the router)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Whether streaming was requested (downgraded when unsupported)
    #[serde(default)]
    pub stream: bool,
}

/// A single generation request flowing Orchestrator → Router → Strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The user message
    pub message: String,

    /// The model to generate with
    pub model_id: String,

    /// Project context snapshot, already truncated to budget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ProjectContext>,

    /// Recent history, already trimmed to the budget's turn limit
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryTurn>,

    /// Request options
    #[serde(default)]
    pub options: GenerationOptions,
}

impl GenerationRequest {
    /// A minimal request with no context or history.
    pub fn new(message: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            model_id: model_id.into(),
            context: None,
            history: Vec::new(),
            options: GenerationOptions::default(),
        }
    }
}

/// Intent tag inferred from the generated response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Reuse an existing component as-is
    Reuse,
    /// Compose existing components together
    Compose,
    /// Extend an existing component
    Extend,
    /// Generate something new
    Generate,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reuse => write!(f, "reuse"),
            Self::Compose => write!(f, "compose"),
            Self::Extend => write!(f, "extend"),
            Self::Generate => write!(f, "generate"),
        }
    }
}

/// Metadata attached to every generation result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Which model produced the result
    pub model: String,

    /// Capability tier the request was routed to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,

    /// Total tokens consumed, when the provider reported usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,

    /// Code blocks extracted from the response
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_blocks: Vec<CodeArtifact>,

    /// Concrete file specs derived from the code blocks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileSpec>,

    /// Which strategy executed the request ("core" / "enhanced")
    #[serde(default)]
    pub strategy: String,

    /// Inferred intent tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,

    /// Per-step outcomes of the tool-calling loop
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolOutcome>,

    /// Tool-loop steps consumed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_used: Option<u32>,

    /// Non-fatal warnings from validation passes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// The normalized result of one generation call.
///
/// Invariant: `success == false` ⇒ `content` is empty and `error` is set;
/// `success == true` ⇒ `error` is `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub success: bool,
    pub content: String,
    pub metadata: GenerationMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationResult {
    /// A successful result.
    pub fn ok(content: impl Into<String>, metadata: GenerationMetadata) -> Self {
        Self {
            success: true,
            content: content.into(),
            metadata,
            error: None,
        }
    }

    /// A terminal failure. Content is always empty.
    pub fn failure(error: impl Into<String>, metadata: GenerationMetadata) -> Self {
        Self {
            success: false,
            content: String::new(),
            metadata,
            error: Some(error.into()),
        }
    }
}
