//! ProjectAnalyzer trait — best-effort project context discovery.
//!
//! Analysis is a consumed collaborator: the engine asks for a snapshot of
//! the workspace (framework, known components, design tokens) and embeds
//! a truncated rendering into prompts. Failures are explicit — callers
//! substitute the documented degraded default instead of the analyzer
//! swallowing errors.

use crate::error::AnalysisError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A component discovered in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    /// Component name (e.g., "Button")
    pub name: String,

    /// Path relative to the workspace root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Exported symbol names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<String>,
}

/// A snapshot of what the analyzer knows about a workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    /// Detected framework (e.g., "react", "vue"), empty when unknown
    #[serde(default)]
    pub framework: String,

    /// Discovered components
    #[serde(default)]
    pub components: Vec<ComponentInfo>,

    /// Design token names (colors, spacing, typography)
    #[serde(default)]
    pub design_tokens: Vec<String>,

    /// Detected build tool (e.g., "vite"), empty when unknown
    #[serde(default)]
    pub build_tool: String,
}

impl ProjectContext {
    /// The documented degraded default used when analysis fails:
    /// an empty context, not an error.
    pub fn degraded() -> Self {
        Self::default()
    }

    /// Whether this context carries any information at all.
    pub fn is_empty(&self) -> bool {
        self.framework.is_empty()
            && self.components.is_empty()
            && self.design_tokens.is_empty()
            && self.build_tool.is_empty()
    }
}

/// The ProjectAnalyzer trait.
#[async_trait]
pub trait ProjectAnalyzer: Send + Sync {
    /// Analyze a workspace path into a context snapshot.
    async fn analyze(
        &self,
        workspace: &str,
    ) -> std::result::Result<ProjectContext, AnalysisError>;
}

/// An analyzer that always returns the degraded empty context.
pub struct NoopAnalyzer;

#[async_trait]
impl ProjectAnalyzer for NoopAnalyzer {
    async fn analyze(
        &self,
        _workspace: &str,
    ) -> std::result::Result<ProjectContext, AnalysisError> {
        Ok(ProjectContext::degraded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_context_is_empty() {
        let ctx = ProjectContext::degraded();
        assert!(ctx.is_empty());
        assert!(ctx.framework.is_empty());
        assert!(ctx.components.is_empty());
    }

    #[tokio::test]
    async fn noop_analyzer_returns_degraded() {
        let ctx = NoopAnalyzer.analyze("/tmp/anywhere").await.unwrap();
        assert!(ctx.is_empty());
    }

    #[test]
    fn context_with_components_is_not_empty() {
        let ctx = ProjectContext {
            framework: "react".into(),
            components: vec![ComponentInfo {
                name: "Button".into(),
                path: Some("src/components/Button.tsx".into()),
                exports: vec!["Button".into()],
            }],
            design_tokens: vec!["color.primary".into()],
            build_tool: "vite".into(),
        };
        assert!(!ctx.is_empty());
    }
}
