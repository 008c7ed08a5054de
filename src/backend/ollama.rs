// backend/ollama.rs — Ollama gateway (OpenAI-compatible chat completions)

use super::{BackendError, BackendGateway, BackendStatus};
use crate::config::BackendConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const PROBE_TIMEOUT_SECS: u64 = 5;
/// Ollama requires a bearer token but never checks it.
const PLACEHOLDER_TOKEN: &str = "ollama";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

pub struct OllamaGateway {
    client: Client,
}

impl OllamaGateway {
    pub fn new() -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_default();

        Self { client }
    }

    async fn send_chat(
        &self,
        url: &str,
        request: &ChatRequest<'_>,
        timeout: Duration,
    ) -> Result<String, BackendError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(PLACEHOLDER_TOKEN)
            .json(request)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::ModelUnavailable(format!(
                "{}: {}",
                request.model,
                body.trim()
            )));
        }

        if !status.is_success() {
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| BackendError::MalformedResponse(format!("invalid JSON: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| {
                BackendError::MalformedResponse("missing choices[0].message.content".to_string())
            })
    }
}

impl Default for OllamaGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendGateway for OllamaGateway {
    async fn probe(&self, config: &BackendConfig) -> BackendStatus {
        let url = format!("{}/api/tags", config.server_root());

        let response = match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Backend probe failed");
                return BackendStatus::unreachable(
                    "Ollama not running. Please start it with: ollama serve",
                );
            }
        };

        if !response.status().is_success() {
            return BackendStatus::unreachable(format!(
                "Ollama server error: {}",
                response.status()
            ));
        }

        let tags: TagsResponse = match response.json().await {
            Ok(tags) => tags,
            Err(e) => {
                tracing::debug!(error = %e, "Backend probe returned invalid payload");
                return BackendStatus::unreachable("Ollama is running but returned invalid response");
            }
        };

        let model_available = tags
            .models
            .iter()
            .any(|model| model_matches(&model.name, config));

        let diagnostic = if model_available {
            "AI features are ready!".to_string()
        } else {
            let family = match config.model_family() {
                "" => config.model_name.as_str(),
                family => family,
            };
            format!(
                "Ollama is running but {} model not found. Run: ollama pull {}",
                family, config.model_name
            )
        };

        BackendStatus {
            server_reachable: true,
            model_available,
            diagnostic,
        }
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        config: &BackendConfig,
        cancel: &CancellationToken,
    ) -> Result<String, BackendError> {
        if cancel.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        let url = format!("{}/chat/completions", config.base_url);
        let request = ChatRequest {
            model: &config.model_name,
            messages: vec![
                Message {
                    role: "system",
                    content: system_prompt,
                },
                Message {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            stream: false,
        };

        // Dropping the losing branch aborts the request and frees its connection.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(model = %config.model_name, "Completion aborted mid-flight");
                Err(BackendError::Cancelled)
            }
            result = self.send_chat(&url, &request, config.timeout()) => result,
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Exact name, or any tag of the same family. A name without a family
/// (`":20b"`) only matches exactly.
fn model_matches(installed: &str, config: &BackendConfig) -> bool {
    let family = config.model_family();
    installed == config.model_name || (!family.is_empty() && installed.contains(family))
}

fn map_transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else if e.is_connect() {
        BackendError::Unreachable(e.to_string())
    } else if e.is_decode() {
        BackendError::MalformedResponse(e.to_string())
    } else {
        BackendError::Unreachable(e.to_string())
    }
}
