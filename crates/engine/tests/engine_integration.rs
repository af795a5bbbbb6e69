//! End-to-end integration tests for the Genloom generation engine.
//!
//! These tests exercise the full pipeline from user message to parsed
//! result: model resolution, budget planning, routing, strategy execution,
//! conversation persistence, and telemetry emission.

use std::sync::Arc;

use genloom_config::EngineConfig;
use genloom_context::budget::BudgetPlanner;
use genloom_core::analyzer::{ComponentInfo, ProjectAnalyzer, ProjectContext};
use genloom_core::capability::{CapabilityTable, ModelCapabilities, Tier};
use genloom_core::error::{AnalysisError, ProviderError, ToolError};
use genloom_core::provider::{
    CompletionRequest, CompletionResponse, LanguageModel, ToolCallRequest, ToolDefinition, Usage,
};
use genloom_core::tool::{NoopExecutor, ToolExecutor, ToolOutput};
use genloom_engine::{GenerateOptions, Orchestrator};
use genloom_session::MemoryStore;
use genloom_telemetry::TelemetryEngine;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence.
struct ScriptedProvider {
    responses: std::sync::Mutex<Vec<CompletionResponse>>,
    call_count: std::sync::Mutex<usize>,
    requests: std::sync::Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses),
            call_count: std::sync::Mutex::new(0),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn text(response: &str) -> Self {
        Self::new(vec![text_response(response)])
    }

    fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    fn last_request(&self) -> CompletionRequest {
        self.requests.lock().unwrap().last().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LanguageModel for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        if *count >= responses.len() {
            panic!(
                "ScriptedProvider exhausted: call #{}, have {}",
                *count,
                responses.len()
            );
        }
        let response = responses[*count].clone();
        *count += 1;
        Ok(response)
    }
}

fn text_response(text: &str) -> CompletionResponse {
    CompletionResponse {
        content: text.into(),
        tool_calls: vec![],
        usage: Some(Usage {
            prompt_tokens: 100,
            completion_tokens: 40,
            total_tokens: 140,
        }),
        model: "mock".into(),
    }
}

fn tool_response(name: &str) -> CompletionResponse {
    CompletionResponse {
        content: String::new(),
        tool_calls: vec![ToolCallRequest {
            id: format!("call_{name}"),
            name: name.into(),
            arguments: serde_json::json!({"path": "Button.tsx", "content": "export {}"}),
        }],
        usage: None,
        model: "mock".into(),
    }
}

// ── Mock ToolExecutor ────────────────────────────────────────────────────

struct FileTools;

#[async_trait::async_trait]
impl ToolExecutor for FileTools {
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "create_file".into(),
            description: "Create a file in the workspace".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" },
                    "content": { "type": "string" }
                },
                "required": ["path", "content"]
            }),
        }]
    }

    async fn execute(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        let path = arguments["path"].as_str().unwrap_or("?");
        Ok(ToolOutput {
            output: format!("{name}: wrote {path}"),
            data: None,
        })
    }
}

// ── Mock Analyzer ────────────────────────────────────────────────────────

struct FixedAnalyzer {
    calls: std::sync::Mutex<usize>,
}

impl FixedAnalyzer {
    fn new() -> Self {
        Self {
            calls: std::sync::Mutex::new(0),
        }
    }
}

#[async_trait::async_trait]
impl ProjectAnalyzer for FixedAnalyzer {
    async fn analyze(&self, _workspace: &str) -> Result<ProjectContext, AnalysisError> {
        *self.calls.lock().unwrap() += 1;
        Ok(ProjectContext {
            framework: "react".into(),
            components: vec![ComponentInfo {
                name: "Button".into(),
                path: Some("src/Button.tsx".into()),
                exports: vec!["Button".into()],
            }],
            design_tokens: vec!["color.primary".into()],
            build_tool: "vite".into(),
        })
    }
}

struct FailingAnalyzer;

#[async_trait::async_trait]
impl ProjectAnalyzer for FailingAnalyzer {
    async fn analyze(&self, workspace: &str) -> Result<ProjectContext, AnalysisError> {
        Err(AnalysisError::WorkspaceNotFound(workspace.into()))
    }
}

// ── Harness ──────────────────────────────────────────────────────────────

struct Harness {
    orchestrator: Orchestrator,
    telemetry: Arc<TelemetryEngine>,
}

fn harness(provider: Arc<dyn LanguageModel>, config: EngineConfig) -> Harness {
    harness_with(
        provider,
        Arc::new(FileTools),
        Arc::new(FixedAnalyzer::new()),
        config,
    )
}

fn harness_with(
    provider: Arc<dyn LanguageModel>,
    tools: Arc<dyn ToolExecutor>,
    analyzer: Arc<dyn ProjectAnalyzer>,
    config: EngineConfig,
) -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let telemetry = Arc::new(TelemetryEngine::new());
    let orchestrator = Orchestrator::new(
        config,
        provider,
        tools,
        analyzer,
        Arc::new(MemoryStore::new()),
        telemetry.clone(),
    );
    Harness {
        orchestrator,
        telemetry,
    }
}

fn config_for(model: &str) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.default_model = model.into();
    config.api_key = Some("test-key".into());
    config.workspace = Some("/tmp/test-workspace".into());
    config
}

const BUTTON_REPLY: &str = "Here is a new Button:\n```tsx\n// filename: Button.tsx\nexport function Button() { return null; }\n```";

// ── Scenario A: low-ceiling model takes the core path ────────────────────

#[tokio::test]
async fn scenario_a_low_ceiling_model_routes_to_core() {
    let provider = Arc::new(ScriptedProvider::text(BUTTON_REPLY));
    let h = harness(provider.clone(), config_for("phi-3-mini"));

    let result = h
        .orchestrator
        .generate("create a button", &GenerateOptions::default())
        .await;

    assert!(result.success);
    assert_eq!(result.metadata.tier, Some(Tier::Core));
    assert_eq!(result.metadata.strategy, "core");
    assert_eq!(provider.calls(), 1);

    // The low-ceiling budget allows a single history turn.
    let table = CapabilityTable::with_defaults();
    let budget = BudgetPlanner::new().budget_for(&table.get("phi-3-mini"));
    assert_eq!(budget.history_turn_limit, 1);

    // The parsed artifact survives to the result.
    assert_eq!(result.metadata.files.len(), 1);
    assert_eq!(result.metadata.files[0].path, "Button.tsx");
}

// ── Scenario B: streaming+tools model runs the tool loop ─────────────────

#[tokio::test]
async fn scenario_b_tool_call_recorded_in_metadata() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response("create_file"),
        text_response(BUTTON_REPLY),
    ]));
    let h = harness(provider.clone(), config_for("claude-sonnet-4"));

    let mut options = GenerateOptions::default();
    options.stream = true;

    let result = h.orchestrator.generate("create a button", &options).await;

    assert!(result.success);
    assert_eq!(result.metadata.tier, Some(Tier::Enhanced));
    assert_eq!(result.metadata.strategy, "enhanced");
    assert!(result.metadata.steps_used.unwrap() >= 1);
    assert!(!result.metadata.tool_results.is_empty());
    assert!(result.metadata.tool_results[0].success);
    assert_eq!(provider.calls(), 2);
}

// ── Scenario C: expired sessions start fresh ─────────────────────────────

#[tokio::test]
async fn scenario_c_expired_session_not_resurrected() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response("first answer"),
        text_response("second answer"),
    ]));

    let mut config = config_for("phi-3-mini");
    config.session.idle_timeout_secs = 0;
    let h = harness(provider, config);

    h.orchestrator
        .generate("first message", &GenerateOptions::default())
        .await;

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    h.orchestrator
        .generate("second message", &GenerateOptions::default())
        .await;

    // The old session expired; only the turns of the second exchange
    // survive in the fresh session.
    let key = "/tmp/test-workspace".to_string();
    let turns = h.orchestrator.store().history(&key).await.unwrap();
    assert!(turns.iter().all(|t| !t.content.contains("first")));
}

// ── Streaming fallback ───────────────────────────────────────────────────

#[tokio::test]
async fn streaming_falls_back_for_non_streaming_model() {
    // llama-3-8b does not support streaming; the call must degrade to a
    // plain completion and still deliver content through the callback.
    let provider = Arc::new(ScriptedProvider::text("non-streamed answer"));
    let h = harness(provider.clone(), config_for("llama-3-8b"));

    let delivered = std::sync::Mutex::new(String::new());
    let result = h
        .orchestrator
        .generate_streaming(
            "hello",
            |chunk| delivered.lock().unwrap().push_str(chunk),
            &GenerateOptions::default(),
        )
        .await;

    assert!(result.success);
    assert_eq!(*delivered.lock().unwrap(), "non-streamed answer");
    assert!(!provider.last_request().stream);
}

// ── Context assembly ─────────────────────────────────────────────────────

#[tokio::test]
async fn project_context_embedded_and_cached() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response("one"),
        text_response("two"),
    ]));
    let analyzer = Arc::new(FixedAnalyzer::new());
    let h = harness_with(
        provider.clone(),
        Arc::new(NoopExecutor),
        analyzer.clone(),
        config_for("gpt-3.5-turbo"),
    );

    h.orchestrator
        .generate("style the button", &GenerateOptions::default())
        .await;
    h.orchestrator
        .generate("again please", &GenerateOptions::default())
        .await;

    // Same workspace, same minute bucket: one analysis pass.
    assert_eq!(*analyzer.calls.lock().unwrap(), 1);

    // The core prompt embeds the analyzed context.
    let prompt = &provider.last_request().messages[0].content;
    assert!(prompt.contains("react"));
    assert!(prompt.contains("Button"));
}

#[tokio::test]
async fn analysis_failure_degrades_to_empty_context() {
    let provider = Arc::new(ScriptedProvider::text("still works"));
    let h = harness_with(
        provider.clone(),
        Arc::new(NoopExecutor),
        Arc::new(FailingAnalyzer),
        config_for("gpt-3.5-turbo"),
    );

    let result = h
        .orchestrator
        .generate("hello", &GenerateOptions::default())
        .await;

    assert!(result.success);
    let prompt = &provider.last_request().messages[0].content;
    assert!(!prompt.contains("## Project"));
}

#[tokio::test]
async fn include_context_false_skips_analysis() {
    let provider = Arc::new(ScriptedProvider::text("ok"));
    let analyzer = Arc::new(FixedAnalyzer::new());
    let mut config = config_for("gpt-3.5-turbo");
    config.include_context = false;

    let h = harness_with(provider, Arc::new(NoopExecutor), analyzer.clone(), config);
    h.orchestrator
        .generate("hello", &GenerateOptions::default())
        .await;

    assert_eq!(*analyzer.calls.lock().unwrap(), 0);
}

// ── Conversation persistence ─────────────────────────────────────────────

#[tokio::test]
async fn turns_committed_to_store() {
    let provider = Arc::new(ScriptedProvider::text("the answer"));
    let h = harness(provider, config_for("phi-3-mini"));

    let mut options = GenerateOptions::default();
    options.session = Some("s1".into());

    h.orchestrator.generate("the question", &options).await;

    let turns = h.orchestrator.store().history("s1").await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].content, "the question");
    assert_eq!(turns[1].content, "the answer");
    assert_eq!(turns[1].metadata["strategy"], "core");
}

#[tokio::test]
async fn history_threaded_into_follow_up() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response("blue works well"),
        text_response("noted"),
    ]));
    // gpt-4o: full budget, 12 history turns.
    let h = harness(provider.clone(), config_for("gpt-4o"));

    let mut options = GenerateOptions::default();
    options.session = Some("s1".into());

    h.orchestrator.generate("pick a color", &options).await;
    h.orchestrator.generate("use it everywhere", &options).await;

    // The second request's messages contain the first exchange.
    let request = provider.last_request();
    let all: Vec<&str> = request.messages.iter().map(|m| m.content.as_str()).collect();
    assert!(all.contains(&"pick a color"));
    assert!(all.contains(&"blue works well"));
    assert!(all.contains(&"use it everywhere"));
}

// ── Failure handling & telemetry ─────────────────────────────────────────

struct AlwaysFailing(ProviderError);

#[async_trait::async_trait]
impl LanguageModel for AlwaysFailing {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        Err(self.0.clone())
    }
}

#[tokio::test]
async fn provider_failure_yields_structured_result_and_record() {
    let provider = Arc::new(AlwaysFailing(ProviderError::AuthenticationFailed(
        "key rejected".into(),
    )));
    let h = harness(provider, config_for("phi-3-mini"));

    let result = h
        .orchestrator
        .generate("hello", &GenerateOptions::default())
        .await;

    assert!(!result.success);
    assert!(result.content.is_empty());
    assert!(result.error.as_ref().unwrap().contains("credential"));

    // A record was emitted despite the failure.
    let summary = h.telemetry.summary();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.failures, 1);
    let record = &h.telemetry.recent(1)[0];
    assert_eq!(record.tier, "core");
    assert!(record.error.as_ref().unwrap().contains("credential"));
}

#[tokio::test]
async fn telemetry_recorded_on_success() {
    let provider = Arc::new(ScriptedProvider::text(BUTTON_REPLY));
    let h = harness(provider, config_for("phi-3-mini"));

    h.orchestrator
        .generate("create a button", &GenerateOptions::default())
        .await;

    let summary = h.telemetry.summary();
    assert_eq!(summary.successes, 1);
    assert_eq!(summary.total_files, 1);
    assert_eq!(summary.total_tokens, 140);
}

// ── Post-hoc validation ──────────────────────────────────────────────────

#[tokio::test]
async fn validate_output_flags_exportless_component() {
    let reply = "Done:\n```tsx\n// filename: Broken.tsx\nfunction Broken() { return null; }\n```";
    let provider = Arc::new(ScriptedProvider::text(reply));

    let mut config = config_for("phi-3-mini");
    config.validate_output = true;
    let h = harness(provider, config);

    let result = h
        .orchestrator
        .generate("make a component", &GenerateOptions::default())
        .await;

    assert!(result.success);
    assert!(
        result
            .metadata
            .warnings
            .iter()
            .any(|w| w.contains("Broken.tsx") && w.contains("no export"))
    );
}

// ── Health check ─────────────────────────────────────────────────────────

#[tokio::test]
async fn health_check_reports_missing_configuration() {
    let provider = Arc::new(ScriptedProvider::text("unused"));
    let mut config = EngineConfig::default();
    config.api_key = None;
    config.workspace = None;
    let h = harness(provider, config);

    let report = h.orchestrator.health_check();
    assert!(!report.healthy);
    assert!(report.issues.iter().any(|i| i.contains("credential")));
    assert!(report.issues.iter().any(|i| i.contains("workspace")));
}

#[tokio::test]
async fn health_check_flags_critically_low_ceiling() {
    let provider = Arc::new(ScriptedProvider::text("unused"));
    let mut table = CapabilityTable::with_defaults();
    let mut tiny = ModelCapabilities::conservative("tiny-model");
    tiny.max_output_tokens = 512;
    table.register(tiny);

    let telemetry = Arc::new(TelemetryEngine::new());
    let orchestrator = Orchestrator::with_table(
        config_for("tiny-model"),
        provider,
        Arc::new(NoopExecutor),
        Arc::new(FixedAnalyzer::new()),
        Arc::new(MemoryStore::new()),
        telemetry,
        Arc::new(table),
    );

    let report = orchestrator.health_check();
    assert!(!report.healthy);
    assert!(report.issues.iter().any(|i| i.contains("critically low")));
}

#[tokio::test]
async fn health_check_passes_with_full_configuration() {
    let provider = Arc::new(ScriptedProvider::text("unused"));
    let h = harness(provider, config_for("claude-sonnet-4"));

    let report = h.orchestrator.health_check();
    assert!(report.healthy, "issues: {:?}", report.issues);
}
