// orchestrator/diagnostics.rs — Structured diagnostic events

use crate::prompt_engine::TransformationKind;
use chrono::{DateTime, Utc};

/// A non-fatal problem observed while running a batch or custom request.
#[derive(Debug, Clone)]
pub struct DiagnosticEvent {
    /// Stable failure label, e.g. `timeout` or `malformed_response`.
    pub kind: &'static str,
    pub spec: Option<TransformationKind>,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl DiagnosticEvent {
    pub fn new(kind: &'static str, spec: Option<TransformationKind>, message: impl Into<String>) -> Self {
        Self {
            kind,
            spec,
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

/// Receiver for diagnostic events.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, event: DiagnosticEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, event: DiagnosticEvent) {
        tracing::warn!(
            kind = event.kind,
            spec = event.spec.map(|k| k.as_str()).unwrap_or("-"),
            timestamp = %event.timestamp.to_rfc3339(),
            "{}",
            event.message
        );
    }
}
