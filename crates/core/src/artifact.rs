//! Code artifacts extracted from generated text.
//!
//! Generated responses carry fenced code blocks; the parser turns each
//! block into a `ParsedArtifact` so malformed blocks surface as failures
//! instead of being silently dropped.

use serde::{Deserialize, Serialize};

/// A code block extracted from a generated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeArtifact {
    /// Language tag from the fence (may be empty)
    pub language: String,

    /// The code content
    pub code: String,

    /// Inferred or annotated filename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Why a fenced block could not be turned into an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    /// Human-readable reason
    pub reason: String,

    /// A short snippet of the offending text
    pub snippet: String,
}

/// The outcome of parsing one fenced block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedArtifact {
    Artifact(CodeArtifact),
    Failure(ParseFailure),
}

impl ParsedArtifact {
    /// The artifact, if this entry parsed cleanly.
    pub fn artifact(&self) -> Option<&CodeArtifact> {
        match self {
            Self::Artifact(a) => Some(a),
            Self::Failure(_) => None,
        }
    }
}

/// The category a generated file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Component,
    Hook,
    Util,
    Test,
    Style,
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Component => write!(f, "component"),
            Self::Hook => write!(f, "hook"),
            Self::Util => write!(f, "util"),
            Self::Test => write!(f, "test"),
            Self::Style => write!(f, "style"),
        }
    }
}

/// A concrete file the host editor could materialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    /// Relative path for the file
    pub path: String,

    /// File content
    pub content: String,

    /// Categorization used by presentation layers
    pub category: FileCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_artifact_accessor() {
        let ok = ParsedArtifact::Artifact(CodeArtifact {
            language: "tsx".into(),
            code: "export const A = 1;".into(),
            filename: Some("A.tsx".into()),
        });
        assert!(ok.artifact().is_some());

        let bad = ParsedArtifact::Failure(ParseFailure {
            reason: "unterminated fence".into(),
            snippet: "```tsx".into(),
        });
        assert!(bad.artifact().is_none());
    }

    #[test]
    fn category_display() {
        assert_eq!(FileCategory::Component.to_string(), "component");
        assert_eq!(FileCategory::Style.to_string(), "style");
    }

    #[test]
    fn file_spec_serialization_roundtrip() {
        let spec = FileSpec {
            path: "src/components/Button.tsx".into(),
            content: "export function Button() {}".into(),
            category: FileCategory::Component,
        };
        let json = serde_json::to_string(&spec).unwrap();
        let back: FileSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
        assert!(json.contains("\"component\""));
    }
}
