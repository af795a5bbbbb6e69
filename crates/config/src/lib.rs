//! Configuration loading, validation, and management for Genloom.
//!
//! Loads configuration from a TOML file with environment variable
//! overrides. Validates all settings at load time. The credential is
//! redacted from Debug output.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Provider API key (can also come from the environment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default model for generation
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default max tokens per response (clamped to the model ceiling)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Whether to include project context in prompts
    #[serde(default = "default_true")]
    pub include_context: bool,

    /// Whether to run the post-hoc output validation pass
    #[serde(default)]
    pub validate_output: bool,

    /// Workspace root the analyzer inspects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,

    /// Conversation session retention settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Generation strategy settings
    #[serde(default)]
    pub generation: GenerationConfig,
}

fn default_model() -> String {
    "claude-sonnet-4".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_model", &self.default_model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("include_context", &self.include_context)
            .field("validate_output", &self.validate_output)
            .field("workspace", &self.workspace)
            .field("session", &self.session)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Conversation session retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum turns retained per session
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Opening turns always retained when trimming overflow
    #[serde(default = "default_head_retain")]
    pub head_retain: usize,

    /// Idle seconds after which a session expires
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_max_turns() -> usize {
    50
}
fn default_head_retain() -> usize {
    10
}
fn default_idle_timeout() -> u64 {
    30 * 60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            head_retain: default_head_retain(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

/// Generation strategy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum sequential tool-loop steps before forced termination
    #[serde(default = "default_max_tool_steps")]
    pub max_tool_steps: u32,

    /// Retries on transient provider failures in the core strategy
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_tool_steps() -> u32 {
    5
}
fn default_max_retries() -> u32 {
    2
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tool_steps: default_max_tool_steps(),
            max_retries: default_max_retries(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a specific file path, then apply
    /// environment overrides.
    ///
    /// Environment variables:
    /// - `GENLOOM_API_KEY` — credential (highest priority when config has none)
    /// - `GENLOOM_MODEL` — overrides `default_model`
    /// - `GENLOOM_WORKSPACE` — overrides `workspace`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_file(path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("GENLOOM_API_KEY").ok();
        }
        if let Ok(model) = std::env::var("GENLOOM_MODEL") {
            config.default_model = model;
        }
        if let Ok(workspace) = std::env::var("GENLOOM_WORKSPACE") {
            config.workspace = Some(PathBuf::from(workspace));
        }

        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.session.max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "session.max_turns must be at least 1".into(),
            ));
        }
        if self.session.head_retain >= self.session.max_turns {
            return Err(ConfigError::ValidationError(
                "session.head_retain must be smaller than session.max_turns".into(),
            ));
        }
        if self.generation.max_tool_steps == 0 {
            return Err(ConfigError::ValidationError(
                "generation.max_tool_steps must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_model(),
            max_tokens: None,
            temperature: default_temperature(),
            include_context: true,
            validate_output: false,
            workspace: None,
            session: SessionConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
