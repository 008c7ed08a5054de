// backend/types.rs — Backend status and error definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of a health probe against the model backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStatus {
    pub server_reachable: bool,
    pub model_available: bool,
    pub diagnostic: String,
}

impl BackendStatus {
    pub fn unreachable(diagnostic: impl Into<String>) -> Self {
        Self {
            server_reachable: false,
            model_available: false,
            diagnostic: diagnostic.into(),
        }
    }

    /// True when a generation call has a chance of succeeding.
    pub fn is_ready(&self) -> bool {
        self.server_reachable && self.model_available
    }

    pub fn availability(&self) -> BackendAvailability {
        match (self.server_reachable, self.model_available) {
            (true, true) => BackendAvailability::Ready,
            (true, false) => BackendAvailability::Degraded,
            (false, _) => BackendAvailability::Unavailable,
        }
    }
}

/// Availability as seen by the periodic health monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendAvailability {
    Unknown,
    Probing,
    Ready,
    /// Server answers but the configured model is missing.
    Degraded,
    Unavailable,
}

/// Failure of a single prompt exchange.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Backend rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

impl BackendError {
    /// Short stable label used in diagnostic events.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Unreachable(_) => "unreachable",
            BackendError::Timeout => "timeout",
            BackendError::MalformedResponse(_) => "malformed_response",
            BackendError::ModelUnavailable(_) => "model_unavailable",
            BackendError::Cancelled => "cancelled",
            BackendError::Rejected { .. } => "rejected",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BackendError::Cancelled)
    }
}
