//! The enhanced strategy — streaming and tool-calling generation.
//!
//! Streaming requests buffer the entire stream before returning: chunked
//! delivery to callers happens above this layer. Non-streaming requests
//! run a bounded tool-calling loop: the model may request tools for a
//! fixed number of rounds, each invocation is dispatched sequentially
//! (tool execution mutates shared workspace state, so parallel dispatch
//! is unsafe), and every per-step outcome lands in result metadata. A
//! single failed tool call is reported back to the model and is non-fatal.

use crate::{Strategy, parsed_metadata, prompt};
use async_trait::async_trait;
use genloom_context::budget::BudgetPlanner;
use genloom_core::cancel::CancelToken;
use genloom_core::capability::CapabilityTable;
use genloom_core::error::Result;
use genloom_core::generation::{GenerationRequest, GenerationResult};
use genloom_core::message::Role;
use genloom_core::provider::{ChatMessage, CompletionRequest, LanguageModel, Usage};
use genloom_core::tool::{ToolExecutor, ToolOutcome};
use std::sync::Arc;
use tracing::{debug, warn};

/// The streaming + tool-calling strategy.
pub struct EnhancedStrategy {
    provider: Arc<dyn LanguageModel>,
    tools: Arc<dyn ToolExecutor>,
    table: Arc<CapabilityTable>,
    planner: BudgetPlanner,
    max_tool_steps: u32,
}

impl EnhancedStrategy {
    pub fn new(
        provider: Arc<dyn LanguageModel>,
        tools: Arc<dyn ToolExecutor>,
        table: Arc<CapabilityTable>,
    ) -> Self {
        Self {
            provider,
            tools,
            table,
            planner: BudgetPlanner::new(),
            max_tool_steps: 5,
        }
    }

    /// Set the maximum number of tool-calling rounds.
    pub fn with_max_tool_steps(mut self, max: u32) -> Self {
        self.max_tool_steps = max;
        self
    }

    /// System prompt: format instructions plus the budgeted context section.
    fn build_system(&self, request: &GenerationRequest) -> String {
        let caps = self.table.get(&request.model_id);
        let budget = self.planner.budget_for(&caps);

        let mut system = prompt::system_prompt(&budget);
        if let Some(context) = &request.context {
            let rendered = prompt::render_context(context, &budget);
            if !rendered.is_empty() {
                system.push_str("\n\n");
                system.push_str(&rendered);
            }
        }
        system
    }

    /// History projected into provider chat messages, plus the user message.
    fn build_messages(&self, request: &GenerationRequest) -> Vec<ChatMessage> {
        let mut messages: Vec<ChatMessage> = request
            .history
            .iter()
            .map(|turn| match turn.role {
                Role::User => ChatMessage::user(&turn.content),
                Role::Assistant => ChatMessage::assistant(&turn.content),
            })
            .collect();
        messages.push(ChatMessage::user(&request.message));
        messages
    }

    /// Buffer a full stream into a single response body.
    async fn execute_streaming(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> Result<GenerationResult> {
        let completion = CompletionRequest {
            model: request.model_id.clone(),
            system: self.build_system(request),
            messages: self.build_messages(request),
            temperature: request.options.temperature.unwrap_or(0.7),
            max_tokens: request.options.max_tokens,
            tools: vec![],
            stream: true,
        };

        let mut rx = self.provider.stream(completion).await?;
        let mut content = String::new();
        let mut usage: Option<Usage> = None;

        while let Some(chunk) = rx.recv().await {
            if cancel.is_cancelled() {
                debug!("Cancelled mid-stream, dropping remaining chunks");
                break;
            }
            let chunk = chunk?;
            if let Some(delta) = chunk.content {
                content.push_str(&delta);
            }
            if chunk.usage.is_some() {
                usage = chunk.usage;
            }
            if chunk.done {
                break;
            }
        }

        let tokens_used = usage.map(|u| u.total_tokens);
        let metadata = parsed_metadata(self.tag(), request.model_id.clone(), &content, tokens_used);
        Ok(GenerationResult::ok(content, metadata))
    }

    /// The bounded tool-calling loop.
    async fn execute_tool_loop(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> Result<GenerationResult> {
        let system = self.build_system(request);
        let mut messages = self.build_messages(request);
        let tool_definitions = self.tools.definitions();

        let mut rounds = 0u32;
        let mut tool_results: Vec<ToolOutcome> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut total_tokens = 0u32;
        let mut saw_usage = false;

        let content = loop {
            let completion = CompletionRequest {
                model: request.model_id.clone(),
                system: system.clone(),
                messages: messages.clone(),
                temperature: request.options.temperature.unwrap_or(0.7),
                max_tokens: request.options.max_tokens,
                tools: tool_definitions.clone(),
                stream: false,
            };

            let response = self.provider.complete(completion).await?;
            if let Some(usage) = &response.usage {
                total_tokens += usage.total_tokens;
                saw_usage = true;
            }

            if response.tool_calls.is_empty() {
                break response.content;
            }

            if rounds >= self.max_tool_steps {
                warn!(
                    rounds,
                    max = self.max_tool_steps,
                    "Tool loop reached step limit, forcing termination"
                );
                warnings.push(format!("tool loop terminated after {rounds} steps"));
                break response.content;
            }

            if cancel.is_cancelled() {
                debug!("Cancelled, skipping remaining tool calls");
                warnings.push("generation cancelled before completion".into());
                break response.content;
            }

            rounds += 1;
            debug!(
                round = rounds,
                calls = response.tool_calls.len(),
                "Executing tool calls"
            );

            // The assistant turn that requested the tools goes back first.
            messages.push(ChatMessage {
                role: genloom_core::provider::ChatRole::Assistant,
                content: response.content.clone(),
                tool_calls: response.tool_calls.clone(),
                tool_call_id: None,
            });

            // Sequential: later calls may depend on earlier results.
            for call in &response.tool_calls {
                if cancel.is_cancelled() {
                    break;
                }
                match self.tools.execute(&call.name, call.arguments.clone()).await {
                    Ok(output) => {
                        tool_results.push(ToolOutcome {
                            tool_name: call.name.clone(),
                            success: true,
                            output: output.output.clone(),
                        });
                        messages.push(ChatMessage::tool_result(&call.id, &output.output));
                    }
                    Err(e) => {
                        warn!(tool = %call.name, error = %e, "Tool execution failed");
                        let report = format!("Error: {e}");
                        tool_results.push(ToolOutcome {
                            tool_name: call.name.clone(),
                            success: false,
                            output: report.clone(),
                        });
                        // Report the error to the model so it can recover.
                        messages.push(ChatMessage::tool_result(&call.id, &report));
                    }
                }
            }
        };

        let tokens_used = saw_usage.then_some(total_tokens);
        let mut metadata =
            parsed_metadata(self.tag(), request.model_id.clone(), &content, tokens_used);
        metadata.tool_results = tool_results;
        metadata.steps_used = Some(rounds);
        metadata.warnings = warnings;
        Ok(GenerationResult::ok(content, metadata))
    }
}

#[async_trait]
impl Strategy for EnhancedStrategy {
    fn tag(&self) -> &'static str {
        "enhanced"
    }

    async fn execute(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> Result<GenerationResult> {
        // Tool calls cannot ride a buffered stream, and streaming is
        // buffered at this layer anyway: when the executor actually has
        // tools, the tool loop takes precedence over a streaming request.
        let has_tools = !self.tools.definitions().is_empty();
        if request.options.stream && !has_tools {
            self.execute_streaming(request, cancel).await
        } else {
            self.execute_tool_loop(request, cancel).await
        }
    }
}
