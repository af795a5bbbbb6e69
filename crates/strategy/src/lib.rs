//! Generation strategies — two interchangeable execution paths.
//!
//! A strategy turns a `GenerationRequest` into a `GenerationResult`:
//!
//! - [`CoreStrategy`] is the degraded-capability path: one large prompt,
//!   one completion call with a bounded transient retry, fenced-block
//!   parsing of the reply. It assumes nothing beyond plain text
//!   completion.
//! - [`EnhancedStrategy`] adds streaming (buffered before return) and a
//!   bounded sequential tool-calling loop for models that support them.
//!
//! Strategies recover from everything they can; errors they cannot absorb
//! are returned as `Err` for the router to normalize into a failure
//! result. Neither path panics on malformed model output.

pub mod core;
pub mod enhanced;
pub mod intent;
pub mod parse;
pub mod prompt;

use async_trait::async_trait;
use genloom_core::cancel::CancelToken;
use genloom_core::error::Result;
use genloom_core::generation::{GenerationMetadata, GenerationRequest, GenerationResult};

pub use crate::core::CoreStrategy;
pub use crate::enhanced::EnhancedStrategy;

/// The strategy contract: turn a request into a result.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// The tag recorded in result metadata ("core" / "enhanced").
    fn tag(&self) -> &'static str;

    /// Execute the request. The cancel token is checked between provider
    /// calls, tool invocations, and stream chunks.
    async fn execute(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> Result<GenerationResult>;
}

/// Parse response text into result metadata shared by both strategies.
pub(crate) fn parsed_metadata(
    strategy: &str,
    model: String,
    content: &str,
    tokens_used: Option<u32>,
) -> GenerationMetadata {
    let parsed = parse::parse_blocks(content);
    let failures = parsed.iter().filter(|p| p.artifact().is_none()).count();
    if failures > 0 {
        tracing::debug!(failures, "Some fenced blocks failed to parse");
    }

    let code_blocks: Vec<_> = parsed.iter().filter_map(|p| p.artifact().cloned()).collect();
    let files = parse::file_specs(&code_blocks);

    GenerationMetadata {
        model,
        tokens_used,
        files,
        code_blocks,
        strategy: strategy.to_string(),
        intent: Some(intent::infer_intent(content)),
        ..Default::default()
    }
}
