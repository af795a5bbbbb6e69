//! The orchestrator — top-level generation entry points.
//!
//! `generate` assembles everything a strategy needs (model resolution,
//! cached project context, budgeted history), delegates to the router,
//! commits conversation turns, optionally runs a cheap post-hoc output
//! check, and always emits a metrics record — success or failure.

use crate::context_cache::ContextCache;
use crate::router::Router;
use chrono::Utc;
use genloom_config::EngineConfig;
use genloom_context::budget::BudgetPlanner;
use genloom_core::analyzer::{ProjectAnalyzer, ProjectContext};
use genloom_core::artifact::FileCategory;
use genloom_core::cancel::CancelToken;
use genloom_core::capability::CapabilityTable;
use genloom_core::generation::{GenerationOptions, GenerationRequest, GenerationResult};
use genloom_core::message::Role;
use genloom_core::provider::LanguageModel;
use genloom_core::store::PersistenceStore;
use genloom_core::tool::ToolExecutor;
use genloom_session::{ConversationStore, Retention};
use genloom_strategy::{CoreStrategy, EnhancedStrategy};
use genloom_telemetry::{GenerationRecord, MetricsSink};
use std::sync::Arc;
use tracing::{info, warn};

/// Below this output ceiling the selected model is reported unhealthy.
const CRITICAL_CEILING: u32 = 1_024;

/// Per-call options for the public entry points.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Model override; falls back to the configured default.
    pub model: Option<String>,

    /// Session key; falls back to the workspace path, then "default".
    pub session: Option<String>,

    /// Max tokens override (still clamped by the router).
    pub max_tokens: Option<u32>,

    /// Temperature override.
    pub temperature: Option<f32>,

    /// Request streaming (downgraded when the model lacks support).
    pub stream: bool,
}

/// Aggregated configuration health.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub healthy: bool,
    pub issues: Vec<String>,
}

/// The orchestrator.
pub struct Orchestrator {
    config: EngineConfig,
    table: Arc<CapabilityTable>,
    router: Router,
    store: ConversationStore,
    analyzer: Arc<dyn ProjectAnalyzer>,
    metrics: Arc<dyn MetricsSink>,
    planner: BudgetPlanner,
    cache: ContextCache,
}

impl Orchestrator {
    /// Build an orchestrator with the default capability table.
    pub fn new(
        config: EngineConfig,
        provider: Arc<dyn LanguageModel>,
        tools: Arc<dyn ToolExecutor>,
        analyzer: Arc<dyn ProjectAnalyzer>,
        persistence: Arc<dyn PersistenceStore>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self::with_table(
            config,
            provider,
            tools,
            analyzer,
            persistence,
            metrics,
            Arc::new(CapabilityTable::with_defaults()),
        )
    }

    /// Build an orchestrator over an explicit capability table.
    #[allow(clippy::too_many_arguments)]
    pub fn with_table(
        config: EngineConfig,
        provider: Arc<dyn LanguageModel>,
        tools: Arc<dyn ToolExecutor>,
        analyzer: Arc<dyn ProjectAnalyzer>,
        persistence: Arc<dyn PersistenceStore>,
        metrics: Arc<dyn MetricsSink>,
        table: Arc<CapabilityTable>,
    ) -> Self {
        let core = Arc::new(
            CoreStrategy::new(provider.clone(), table.clone())
                .with_max_retries(config.generation.max_retries),
        );
        let enhanced = Arc::new(
            EnhancedStrategy::new(provider, tools, table.clone())
                .with_max_tool_steps(config.generation.max_tool_steps),
        );
        let router = Router::new(table.clone(), core, enhanced);

        let retention = Retention {
            max_turns: config.session.max_turns,
            head_retain: config.session.head_retain,
            idle_timeout: chrono::Duration::seconds(config.session.idle_timeout_secs as i64),
        };
        let store = ConversationStore::new(persistence, retention);

        Self {
            config,
            table,
            router,
            store,
            analyzer,
            metrics,
            planner: BudgetPlanner::new(),
            cache: ContextCache::new(),
        }
    }

    fn session_key(&self, options: &GenerateOptions) -> String {
        options
            .session
            .clone()
            .or_else(|| {
                self.config
                    .workspace
                    .as_ref()
                    .map(|w| w.to_string_lossy().to_string())
            })
            .unwrap_or_else(|| "default".to_string())
    }

    /// Project context: cached per workspace and one-minute bucket,
    /// refreshed only on a key miss. Analysis failures degrade to the
    /// empty context.
    async fn project_context(&self) -> Option<ProjectContext> {
        let workspace = self
            .config
            .workspace
            .as_ref()?
            .to_string_lossy()
            .to_string();

        let key = ContextCache::bucket_key(&workspace, Utc::now());
        if let Some(cached) = self.cache.get(&key).await {
            return Some(cached);
        }

        let context = match self.analyzer.analyze(&workspace).await {
            Ok(context) => context,
            Err(e) => {
                warn!(error = %e, "Project analysis failed, using degraded empty context");
                ProjectContext::degraded()
            }
        };
        self.cache.insert(key, context.clone()).await;
        Some(context)
    }

    /// Primary entry point.
    pub async fn generate(&self, message: &str, options: &GenerateOptions) -> GenerationResult {
        self.generate_with_cancel(message, options, &CancelToken::new())
            .await
    }

    /// `generate` with an external cancellation token.
    pub async fn generate_with_cancel(
        &self,
        message: &str,
        options: &GenerateOptions,
        cancel: &CancelToken,
    ) -> GenerationResult {
        let model_id = options
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone());
        let session_key = self.session_key(options);

        let caps = self.table.get(&model_id);
        let budget = self.planner.budget_for(&caps);

        let context = if self.config.include_context {
            self.project_context().await
        } else {
            None
        };

        // History excludes the current message; it is committed below.
        let history = match self
            .store
            .history_for_generation(&session_key, budget.history_turn_limit)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(error = %e, "Failed to load history, generating without it");
                Vec::new()
            }
        };

        if let Err(e) = self.store.append(&session_key, Role::User, message, None).await {
            warn!(error = %e, "Failed to persist user turn");
        }

        let request = GenerationRequest {
            message: message.to_string(),
            model_id: model_id.clone(),
            context,
            history,
            options: GenerationOptions {
                max_tokens: options.max_tokens.or(self.config.max_tokens),
                temperature: options.temperature.or(Some(self.config.temperature)),
                stream: options.stream,
            },
        };

        let mut result = self.router.route(request, cancel).await;

        if self.config.validate_output && result.success {
            Self::check_exports(&mut result);
        }

        if result.success && !result.content.is_empty() {
            let mut metadata = serde_json::Map::new();
            metadata.insert("model".into(), serde_json::json!(result.metadata.model));
            metadata.insert(
                "strategy".into(),
                serde_json::json!(result.metadata.strategy),
            );
            if let Err(e) = self
                .store
                .append(&session_key, Role::Assistant, &result.content, Some(metadata))
                .await
            {
                warn!(error = %e, "Failed to persist assistant turn");
            }
        }

        self.emit_record(&result);

        info!(
            model = %result.metadata.model,
            success = result.success,
            strategy = %result.metadata.strategy,
            files = result.metadata.files.len(),
            "Generation completed"
        );

        result
    }

    /// Streaming entry point. Falls back to non-streaming when the active
    /// model lacks support. Strategies buffer the stream, so the callback
    /// receives the complete content once it is available.
    pub async fn generate_streaming<F>(
        &self,
        message: &str,
        on_chunk: F,
        options: &GenerateOptions,
    ) -> GenerationResult
    where
        F: Fn(&str) + Send + Sync,
    {
        let model_id = options
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone());

        let mut options = options.clone();
        options.stream = self.table.get(&model_id).supports_streaming;

        let result = self.generate(message, &options).await;
        if result.success && !result.content.is_empty() {
            on_chunk(&result.content);
        }
        result
    }

    /// Aggregate configuration health.
    pub fn health_check(&self) -> HealthReport {
        let mut issues = Vec::new();

        if !self.config.has_api_key() {
            issues.push("no API credential configured".to_string());
        }
        if self.config.workspace.is_none() {
            issues.push("no workspace configured".to_string());
        }

        let caps = self.table.get(&self.config.default_model);
        if caps.max_output_tokens < CRITICAL_CEILING {
            issues.push(format!(
                "model '{}' output ceiling {} is critically low",
                self.config.default_model, caps.max_output_tokens
            ));
        }

        HealthReport {
            healthy: issues.is_empty(),
            issues,
        }
    }

    /// Non-fatal post-hoc check: a component file without any export
    /// marker is almost certainly unusable as written.
    fn check_exports(result: &mut GenerationResult) {
        let mut warnings = Vec::new();
        for spec in &result.metadata.files {
            if spec.category == FileCategory::Component && !spec.content.contains("export") {
                warnings.push(format!("component file '{}' has no export", spec.path));
            }
        }
        result.metadata.warnings.extend(warnings);
    }

    fn emit_record(&self, result: &GenerationResult) {
        let mut record = GenerationRecord::new(result.success, &result.metadata.model)
            .with_tier(
                result
                    .metadata
                    .tier
                    .map(|t| t.to_string())
                    .unwrap_or_default(),
            )
            .with_strategy(&result.metadata.strategy)
            .with_tokens(result.metadata.tokens_used)
            .with_files(result.metadata.files.len())
            .with_steps(result.metadata.steps_used);
        if let Some(error) = &result.error {
            record = record.with_error(error);
        }
        self.metrics.record(record);
    }

    /// The conversation store, for inspection and explicit resets.
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }
}
