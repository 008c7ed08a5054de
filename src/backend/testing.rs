// Scripted gateway shared by unit tests.

use super::{BackendError, BackendGateway, BackendStatus};
use crate::config::BackendConfig;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct ScriptedGateway {
    status: Mutex<BackendStatus>,
    responses: Mutex<VecDeque<Result<String, BackendError>>>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
    delay: Option<Duration>,
    pub prompts: Mutex<Vec<(String, String)>>,
    pub probe_calls: AtomicUsize,
    pub complete_calls: AtomicUsize,
}

impl ScriptedGateway {
    fn with_status(status: BackendStatus) -> Self {
        Self {
            status: Mutex::new(status),
            responses: Mutex::new(VecDeque::new()),
            cancel_after: Mutex::new(None),
            delay: None,
            prompts: Mutex::new(Vec::new()),
            probe_calls: AtomicUsize::new(0),
            complete_calls: AtomicUsize::new(0),
        }
    }

    pub fn ready() -> Self {
        Self::with_status(BackendStatus {
            server_reachable: true,
            model_available: true,
            diagnostic: "ready".to_string(),
        })
    }

    pub fn model_missing() -> Self {
        Self::with_status(BackendStatus {
            server_reachable: true,
            model_available: false,
            diagnostic: "model missing".to_string(),
        })
    }

    pub fn unreachable() -> Self {
        Self::with_status(BackendStatus::unreachable("connection refused"))
    }

    pub fn with_responses(self, responses: Vec<Result<String, BackendError>>) -> Self {
        *self.responses.lock().unwrap() = responses.into();
        self
    }

    /// Cancel `token` once `calls` completions have resolved.
    pub fn cancel_after(self, calls: usize, token: CancellationToken) -> Self {
        *self.cancel_after.lock().unwrap() = Some((calls, token));
        self
    }

    /// Hold every completion for `delay`, giving up early on cancellation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_status(&self, status: BackendStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn user_prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, user)| user.clone())
            .collect()
    }

    pub fn system_prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .map(|(system, _)| system.clone())
            .collect()
    }
}

#[async_trait]
impl BackendGateway for ScriptedGateway {
    async fn probe(&self, _config: &BackendConfig) -> BackendStatus {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.status.lock().unwrap().clone()
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _config: &BackendConfig,
        cancel: &CancellationToken,
    ) -> Result<String, BackendError> {
        if cancel.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        let calls = self.complete_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(BackendError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::MalformedResponse("no scripted reply".to_string())));

        if let Some((after, token)) = self.cancel_after.lock().unwrap().as_ref() {
            if calls >= *after {
                token.cancel();
            }
        }

        response
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
