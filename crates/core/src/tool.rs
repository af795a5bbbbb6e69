//! ToolExecutor trait — the seam the tool-calling loop dispatches through.
//!
//! Tool execution mutates shared workspace state (file creation, project
//! edits), so the loop awaits each invocation sequentially. The executor
//! owns the tool implementations; the engine only sees definitions and
//! outcomes.

use crate::error::ToolError;
use crate::provider::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The successful output of a tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text output fed back to the model
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// The recorded outcome of one tool-loop step, success or failure.
///
/// Every step lands in result metadata so callers can audit the loop even
/// when individual calls failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Which tool was invoked
    pub tool_name: String,

    /// Whether the invocation succeeded
    pub success: bool,

    /// Output on success, error description on failure
    pub output: String,
}

/// The core ToolExecutor trait.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Definitions of every tool this executor can run (sent to the model).
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Execute a named tool with JSON arguments.
    async fn execute(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolOutput, ToolError>;
}

/// An executor with no tools. Useful as a default and in tests.
pub struct NoopExecutor;

#[async_trait]
impl ToolExecutor for NoopExecutor {
    fn definitions(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }

    async fn execute(
        &self,
        name: &str,
        _arguments: serde_json::Value,
    ) -> std::result::Result<ToolOutput, ToolError> {
        Err(ToolError::NotFound(name.to_string()))
    }
}
