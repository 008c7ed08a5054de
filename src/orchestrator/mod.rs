use crate::backend::{BackendError, BackendGateway, BackendStatus, HealthMonitor, OllamaGateway};
use crate::config::BackendConfig;
use crate::prompt_engine::{ContentCategory, PromptPlanner, PromptSpec, TransformationKind};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use self::custom::{CustomError, CustomInstructionProcessor};
use self::diagnostics::{DiagnosticEvent, DiagnosticSink, TracingSink};
use self::metrics::Metrics;
use self::scoring::ScoringPolicy;

pub mod custom;
pub mod diagnostics;
pub mod metrics;
pub mod scoring;

/// One suggestion shown in the overlay panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationResult {
    pub id: String,
    pub title: String,
    pub description: String,
    pub result: String,
    pub confidence: f64,
    /// Set by the UI once the user copies the suggestion; never by the engine.
    pub is_applied: bool,
    #[serde(rename = "transformationType")]
    pub kind: TransformationKind,
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Backend unavailable: {}", .0.diagnostic)]
    BackendUnavailable(BackendStatus),
}

struct ActiveBatch {
    id: u64,
    cancel: CancellationToken,
}

/// Runs planner output through the backend and ranks the results.
pub struct OrchestrationEngine {
    gateway: Arc<dyn BackendGateway>,
    health: Arc<HealthMonitor>,
    planner: PromptPlanner,
    scoring: ScoringPolicy,
    custom: CustomInstructionProcessor,
    diagnostics: Arc<dyn DiagnosticSink>,
    metrics: Mutex<Metrics>,
    active: Mutex<Option<ActiveBatch>>,
    next_batch_id: AtomicU64,
}

impl OrchestrationEngine {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        let health = Arc::new(HealthMonitor::new(gateway.clone()));
        Self::with_health(gateway, health)
    }

    /// Engine talking to a local Ollama server.
    pub fn ollama() -> Self {
        Self::new(Arc::new(OllamaGateway::new()))
    }

    pub fn with_health(gateway: Arc<dyn BackendGateway>, health: Arc<HealthMonitor>) -> Self {
        tracing::info!(gateway = gateway.name(), "Orchestration engine initialized");

        Self {
            custom: CustomInstructionProcessor::new(gateway.clone()),
            gateway,
            health,
            planner: PromptPlanner::new(),
            scoring: ScoringPolicy,
            diagnostics: Arc::new(TracingSink),
            metrics: Mutex::new(Metrics::new()),
            active: Mutex::new(None),
            next_batch_id: AtomicU64::new(1),
        }
    }

    pub fn with_planner(mut self, planner: PromptPlanner) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn health(&self) -> &Arc<HealthMonitor> {
        &self.health
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Generate ranked suggestions for `content`.
    ///
    /// Supersedes any batch still running on this engine: its token is
    /// cancelled and it returns an empty list.
    pub async fn generate_batch(
        &self,
        content: &str,
        category: Option<ContentCategory>,
        config: &BackendConfig,
    ) -> Result<Vec<TransformationResult>, BatchError> {
        let (id, cancel) = self.begin_batch();
        let result = self.run_batch(content, category, config, &cancel).await;
        self.finish_batch(id);
        result
    }

    /// Cancel the batch started by `generate_batch`, if one is running.
    pub fn cancel_active_batch(&self) {
        if let Ok(guard) = self.active.lock() {
            if let Some(active) = guard.as_ref() {
                tracing::info!(batch = active.id, "Cancelling active batch");
                active.cancel.cancel();
            }
        }
    }

    /// Run one batch under a caller-owned cancellation token.
    ///
    /// Specs run sequentially in planner order. Per-spec failures are reported
    /// as diagnostics and skipped; only the pre-flight probe is fatal. A
    /// cancelled batch returns an empty list, discarding completed results.
    pub async fn run_batch(
        &self,
        content: &str,
        category: Option<ContentCategory>,
        config: &BackendConfig,
        cancel: &CancellationToken,
    ) -> Result<Vec<TransformationResult>, BatchError> {
        self.preflight(config).await?;
        let specs = self.planner.plan(content, category);
        Ok(self.run_specs(content, &specs, config, cancel).await)
    }

    /// Request a single transformation kind, bypassing the category table.
    ///
    /// Same pre-flight, failure and cancellation rules as `run_batch`; the
    /// list holds at most one result.
    pub async fn run_transformation(
        &self,
        content: &str,
        kind: TransformationKind,
        config: &BackendConfig,
        cancel: &CancellationToken,
    ) -> Result<Vec<TransformationResult>, BatchError> {
        self.preflight(config).await?;
        let spec = self.planner.spec(kind, content);
        Ok(self.run_specs(content, &[spec], config, cancel).await)
    }

    async fn preflight(&self, config: &BackendConfig) -> Result<(), BatchError> {
        let status = self.health.status(config).await;
        if status.is_ready() {
            return Ok(());
        }

        self.diagnostics.emit(DiagnosticEvent::new(
            "backend_unavailable",
            None,
            status.diagnostic.clone(),
        ));
        Err(BatchError::BackendUnavailable(status))
    }

    async fn run_specs(
        &self,
        content: &str,
        specs: &[PromptSpec],
        config: &BackendConfig,
        cancel: &CancellationToken,
    ) -> Vec<TransformationResult> {
        let stamp = chrono::Utc::now().timestamp_millis();
        let mut results = Vec::with_capacity(specs.len());

        tracing::info!(
            specs = specs.len(),
            content_chars = content.chars().count(),
            "Starting transformation batch"
        );

        for (index, spec) in specs.iter().enumerate() {
            if cancel.is_cancelled() {
                return self.discard_cancelled(spec.kind, results.len());
            }

            match self
                .gateway
                .complete(&spec.system_prompt, &spec.user_prompt, config, cancel)
                .await
            {
                Ok(text) => {
                    let confidence = self.scoring.score(content, &text, spec.kind);
                    tracing::info!(
                        kind = %spec.kind,
                        confidence,
                        result_chars = text.chars().count(),
                        "Transformation succeeded"
                    );
                    self.record(|m| m.record_success(spec.kind));
                    results.push(build_result(spec, text, confidence, result_id(spec.kind, stamp, index)));
                }
                Err(e) if e.is_cancelled() => {
                    return self.discard_cancelled(spec.kind, results.len());
                }
                Err(e) => {
                    // The cached "ready" status no longer holds; reprobe next time.
                    if matches!(e, BackendError::Unreachable(_) | BackendError::ModelUnavailable(_)) {
                        self.health.invalidate();
                    }
                    self.record(|m| m.record_failure(spec.kind));
                    self.diagnostics.emit(DiagnosticEvent::new(
                        e.kind(),
                        Some(spec.kind),
                        format!("Failed to get {} transformation: {}", spec.kind, e),
                    ));
                }
            }
        }

        // Cancellation that lands after the last spec still voids the batch.
        if cancel.is_cancelled() {
            let last = specs.last().map_or(TransformationKind::Explanation, |s| s.kind);
            return self.discard_cancelled(last, results.len());
        }

        // Stable: equal confidences keep planner order.
        results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        if results.is_empty() {
            tracing::warn!("No suggestions available for this content");
        }

        results
    }

    pub async fn process_custom(
        &self,
        content: &str,
        instruction: Option<&str>,
        context_snippets: &[String],
        config: &BackendConfig,
        cancel: &CancellationToken,
    ) -> Result<Option<TransformationResult>, CustomError> {
        self.custom
            .process(content, instruction, context_snippets, config, cancel)
            .await
    }

    fn begin_batch(&self) -> (u64, CancellationToken) {
        let id = self.next_batch_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();

        if let Ok(mut guard) = self.active.lock() {
            if let Some(previous) = guard.replace(ActiveBatch {
                id,
                cancel: cancel.clone(),
            }) {
                tracing::debug!(superseded = previous.id, batch = id, "Superseding running batch");
                previous.cancel.cancel();
            }
        }

        (id, cancel)
    }

    fn finish_batch(&self, id: u64) {
        if let Ok(mut guard) = self.active.lock() {
            if guard.as_ref().is_some_and(|active| active.id == id) {
                *guard = None;
            }
        }
    }

    fn discard_cancelled(&self, at: TransformationKind, completed: usize) -> Vec<TransformationResult> {
        tracing::info!(at = %at, discarded = completed, "Batch cancelled");
        self.record(|m| m.record_cancelled_batch());
        Vec::new()
    }

    fn record(&self, update: impl FnOnce(&mut Metrics)) {
        if let Ok(mut metrics) = self.metrics.lock() {
            update(&mut metrics);
        }
    }
}

fn build_result(spec: &PromptSpec, text: String, confidence: f64, id: String) -> TransformationResult {
    TransformationResult {
        id,
        title: spec.title.clone(),
        description: spec.description.clone(),
        result: text,
        confidence,
        is_applied: false,
        kind: spec.kind,
    }
}

/// `<kind>-<millis>-<index>-<random>`; unique within one call.
pub(crate) fn result_id(kind: TransformationKind, stamp: i64, index: usize) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}-{}", kind, stamp, index, &suffix[..8])
}
