//! # Genloom Core
//!
//! Domain types, traits, and error definitions for the Genloom generation
//! orchestration engine. This crate has **zero framework dependencies** —
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod analyzer;
pub mod artifact;
pub mod cancel;
pub mod capability;
pub mod error;
pub mod generation;
pub mod message;
pub mod provider;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use analyzer::{ComponentInfo, NoopAnalyzer, ProjectAnalyzer, ProjectContext};
pub use artifact::{CodeArtifact, FileCategory, FileSpec, ParseFailure, ParsedArtifact};
pub use cancel::CancelToken;
pub use capability::{CapabilityTable, ModelCapabilities, Tier};
pub use error::{Error, Result};
pub use generation::{
    GenerationMetadata, GenerationOptions, GenerationRequest, GenerationResult, Intent,
};
pub use message::{ConversationSession, HistoryTurn, Role, SessionId, Turn};
pub use provider::{
    ChatMessage, ChatRole, CompletionRequest, CompletionResponse, LanguageModel, StreamChunk,
    ToolCallRequest, ToolDefinition, Usage,
};
pub use store::PersistenceStore;
pub use tool::{NoopExecutor, ToolExecutor, ToolOutcome, ToolOutput};
