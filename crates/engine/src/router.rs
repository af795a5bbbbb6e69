//! The router — tier selection, request adjustment, result normalization.
//!
//! The router is the error boundary of the engine: validation failures are
//! fail-open (logged, then silently adjusted), and every strategy error is
//! converted into a `{success: false}` result with a message matched to
//! its category so presentation layers can offer targeted remediation. No
//! error crosses this boundary as `Err`.

use genloom_core::cancel::CancelToken;
use genloom_core::capability::{CapabilityTable, ModelCapabilities, Tier};
use genloom_core::error::{Error, ProviderError};
use genloom_core::generation::{GenerationMetadata, GenerationRequest, GenerationResult};
use genloom_strategy::Strategy;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fraction of the model ceiling usable by a response; the rest is
/// headroom.
const CEILING_HEADROOM: f32 = 0.9;

/// Routes generation requests to the strategy matching the model's tier.
pub struct Router {
    table: Arc<CapabilityTable>,
    core: Arc<dyn Strategy>,
    enhanced: Arc<dyn Strategy>,
}

impl Router {
    pub fn new(
        table: Arc<CapabilityTable>,
        core: Arc<dyn Strategy>,
        enhanced: Arc<dyn Strategy>,
    ) -> Self {
        Self {
            table,
            core,
            enhanced,
        }
    }

    /// Validate a request against capabilities. Returns the reasons a
    /// strict validator would reject; routing treats them as fail-open.
    pub fn validate(request: &GenerationRequest, caps: &ModelCapabilities) -> Vec<String> {
        let mut issues = Vec::new();

        if request.options.stream && !caps.supports_streaming {
            issues.push(format!(
                "streaming requested but model '{}' does not support it",
                caps.model_id
            ));
        }
        if let Some(max_tokens) = request.options.max_tokens
            && max_tokens > caps.max_output_tokens
        {
            issues.push(format!(
                "max_tokens {} exceeds model ceiling {}",
                max_tokens, caps.max_output_tokens
            ));
        }

        issues
    }

    /// Adjust a request to fit capabilities: clamp `max_tokens` to ~90% of
    /// the ceiling (response headroom) and drop streaming when unsupported.
    fn adjust(request: &mut GenerationRequest, caps: &ModelCapabilities) {
        let ceiling = (caps.max_output_tokens as f32 * CEILING_HEADROOM) as u32;
        request.options.max_tokens = Some(match request.options.max_tokens {
            Some(requested) => requested.min(ceiling),
            None => ceiling,
        });

        if request.options.stream && !caps.supports_streaming {
            request.options.stream = false;
        }
    }

    /// Route a request: resolve tier, adjust, dispatch, normalize.
    pub async fn route(
        &self,
        mut request: GenerationRequest,
        cancel: &CancelToken,
    ) -> GenerationResult {
        let caps = self.table.get(&request.model_id);

        for issue in Self::validate(&request, &caps) {
            warn!(model = %request.model_id, issue = %issue, "Request adjusted to fit capabilities");
        }
        Self::adjust(&mut request, &caps);

        let strategy = match caps.tier {
            Tier::Core => &self.core,
            Tier::Enhanced => &self.enhanced,
        };

        debug!(
            model = %request.model_id,
            tier = %caps.tier,
            strategy = strategy.tag(),
            "Routing generation request"
        );

        let mut result = match strategy.execute(&request, cancel).await {
            Ok(result) => result,
            Err(e) => {
                warn!(model = %request.model_id, error = %e, "Strategy failed");
                GenerationResult::failure(
                    user_message_for(&e),
                    GenerationMetadata {
                        strategy: strategy.tag().to_string(),
                        ..Default::default()
                    },
                )
            }
        };

        // Merge routing facts into metadata.
        if result.metadata.model.is_empty() {
            result.metadata.model = request.model_id.clone();
        }
        result.metadata.tier = Some(caps.tier);
        result
    }
}

/// Map an error to a remediation-friendly message for callers.
fn user_message_for(error: &Error) -> String {
    match error {
        Error::Provider(ProviderError::AuthenticationFailed(detail)) => {
            format!("Missing or invalid API credential: {detail}")
        }
        Error::Provider(ProviderError::NotConfigured(detail)) => {
            format!("Provider is not configured: {detail}")
        }
        Error::Provider(ProviderError::RateLimited { retry_after_secs }) => {
            format!("Rate limited by the provider, retry after {retry_after_secs}s")
        }
        Error::Provider(ProviderError::ModelNotFound(model)) => {
            format!("The configured model was not found: {model}")
        }
        Error::Provider(ProviderError::Timeout(detail)) => {
            format!("The model call timed out: {detail}")
        }
        other => format!("Generation failed: {other}"),
    }
}
