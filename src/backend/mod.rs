// backend/mod.rs — Model backend gateway trait

pub mod health;
pub mod ollama;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use health::HealthMonitor;
pub use ollama::OllamaGateway;
pub use types::{BackendAvailability, BackendError, BackendStatus};

use crate::config::BackendConfig;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// One prompt exchange against the local model backend, plus its health probe.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Lightweight reachability and model check. Never fails; problems are
    /// reported through `BackendStatus::diagnostic`.
    async fn probe(&self, config: &BackendConfig) -> BackendStatus;

    /// Run a single system+user exchange and return the completion text.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        config: &BackendConfig,
        cancel: &CancellationToken,
    ) -> Result<String, BackendError>;

    /// Gateway name for logs.
    fn name(&self) -> &str;
}
