//! The core strategy — the degraded-capability generation path.
//!
//! Must work against any model: no streaming, no tools, no structured
//! output. Everything the model needs lives in one prompt; everything it
//! returns is recovered by the fenced-block scan.

use crate::{Strategy, parsed_metadata, prompt};
use async_trait::async_trait;
use genloom_context::budget::BudgetPlanner;
use genloom_core::cancel::CancelToken;
use genloom_core::capability::CapabilityTable;
use genloom_core::error::{Error, Result};
use genloom_core::generation::{GenerationRequest, GenerationResult};
use genloom_core::provider::{ChatMessage, CompletionRequest, LanguageModel};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Delay between transient-failure retries.
const RETRY_DELAY: Duration = Duration::from_millis(200);

/// The single-shot generation strategy.
pub struct CoreStrategy {
    provider: Arc<dyn LanguageModel>,
    table: Arc<CapabilityTable>,
    planner: BudgetPlanner,
    max_retries: u32,
}

impl CoreStrategy {
    pub fn new(provider: Arc<dyn LanguageModel>, table: Arc<CapabilityTable>) -> Self {
        Self {
            provider,
            table,
            planner: BudgetPlanner::new(),
            max_retries: 2,
        }
    }

    /// Set the retry count for transient provider failures.
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// One completion call with a small bounded retry on transient failure.
    async fn complete_with_retry(
        &self,
        request: CompletionRequest,
        cancel: &CancelToken,
    ) -> Result<genloom_core::provider::CompletionResponse> {
        let mut attempt = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Internal("generation cancelled".into()));
            }
            match self.provider.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max = self.max_retries,
                        error = %e,
                        "Transient provider failure, retrying"
                    );
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl Strategy for CoreStrategy {
    fn tag(&self) -> &'static str {
        "core"
    }

    async fn execute(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> Result<GenerationResult> {
        let caps = self.table.get(&request.model_id);
        let budget = self.planner.budget_for(&caps);

        debug!(
            model = %request.model_id,
            detail = ?budget.detail_mode,
            "Core strategy executing"
        );

        let completion = CompletionRequest {
            model: request.model_id.clone(),
            system: prompt::system_prompt(&budget),
            messages: vec![ChatMessage::user(prompt::core_prompt(request, &budget))],
            temperature: request.options.temperature.unwrap_or(0.7),
            max_tokens: request.options.max_tokens,
            tools: vec![],
            stream: false,
        };

        let response = self.complete_with_retry(completion, cancel).await?;

        let tokens_used = response.usage.as_ref().map(|u| u.total_tokens);
        let metadata = parsed_metadata(self.tag(), response.model, &response.content, tokens_used);
        Ok(GenerationResult::ok(response.content, metadata))
    }
}
