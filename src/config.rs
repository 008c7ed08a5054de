use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_MODEL: &str = "gpt-oss:20b";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

const MIN_TIMEOUT_MS: u64 = 1_000;
const MAX_TEMPERATURE: f32 = 2.0;

const ENV_BASE_URL: &str = "CLIPBOARD_AI_BASE_URL";
const ENV_MODEL: &str = "CLIPBOARD_AI_MODEL";
const ENV_TIMEOUT_MS: &str = "CLIPBOARD_AI_TIMEOUT_MS";
const ENV_TEMPERATURE: &str = "CLIPBOARD_AI_TEMPERATURE";
const ENV_MAX_TOKENS: &str = "CLIPBOARD_AI_MAX_TOKENS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Connection settings for the local model backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendConfig {
    pub base_url: String,
    pub model_name: String,
    pub timeout_ms: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Runtime overrides coming from the settings provider. `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfigOverride {
    pub base_url: Option<String>,
    pub model_name: Option<String>,
    pub timeout_ms: Option<u64>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl BackendConfig {
    /// Defaults overlaid with `CLIPBOARD_AI_*` environment variables (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mut overrides = BackendConfigOverride::default();
        if let Ok(value) = std::env::var(ENV_BASE_URL) {
            overrides.base_url = Some(value);
        }
        if let Ok(value) = std::env::var(ENV_MODEL) {
            overrides.model_name = Some(value);
        }
        if let Ok(value) = std::env::var(ENV_TIMEOUT_MS) {
            overrides.timeout_ms = Some(parse_env(ENV_TIMEOUT_MS, &value)?);
        }
        if let Ok(value) = std::env::var(ENV_TEMPERATURE) {
            overrides.temperature = Some(parse_env(ENV_TEMPERATURE, &value)?);
        }
        if let Ok(value) = std::env::var(ENV_MAX_TOKENS) {
            overrides.max_tokens = Some(parse_env(ENV_MAX_TOKENS, &value)?);
        }

        let mut config = Self::default();
        config.apply_override(overrides);
        Ok(config)
    }

    pub fn apply_override(&mut self, overrides: BackendConfigOverride) {
        if let Some(base_url) = overrides.base_url {
            let trimmed = base_url.trim();
            if !trimmed.is_empty() {
                self.base_url = trimmed.to_string();
            }
        }

        if let Some(model_name) = overrides.model_name {
            let trimmed = model_name.trim();
            if !trimmed.is_empty() {
                self.model_name = trimmed.to_string();
            }
        }

        if let Some(timeout_ms) = overrides.timeout_ms {
            self.timeout_ms = timeout_ms;
        }

        if let Some(temperature) = overrides.temperature {
            self.temperature = temperature;
        }

        if let Some(max_tokens) = overrides.max_tokens {
            self.max_tokens = max_tokens;
        }

        self.normalize();
    }

    pub fn normalize(&mut self) {
        self.base_url = normalize_base_url(&self.base_url);
        if self.model_name.trim().is_empty() {
            self.model_name = DEFAULT_MODEL.to_string();
        }
        self.timeout_ms = self.timeout_ms.max(MIN_TIMEOUT_MS);
        self.temperature = if self.temperature.is_finite() {
            self.temperature.clamp(0.0, MAX_TEMPERATURE)
        } else {
            DEFAULT_TEMPERATURE
        };
        self.max_tokens = self.max_tokens.max(1);
    }

    /// Server root with the OpenAI-compatible `/v1` suffix removed.
    pub fn server_root(&self) -> &str {
        self.base_url
            .strip_suffix("/v1")
            .unwrap_or(&self.base_url)
    }

    /// Model family used for availability matching (`gpt-oss:20b` -> `gpt-oss`).
    /// Empty when the name starts with the tag (`:20b`).
    pub fn model_family(&self) -> &str {
        self.model_name
            .split(':')
            .next()
            .unwrap_or(&self.model_name)
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

pub fn normalize_base_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Load settings from `path`, creating the file with defaults when missing.
/// An unreadable file is kept as `<name>.json.bak` and replaced with defaults.
pub fn load_or_create(path: &Path) -> Result<BackendConfig, ConfigError> {
    if !path.exists() {
        let config = BackendConfig::default();
        save(path, &config)?;
        return Ok(config);
    }

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    match serde_json::from_str::<BackendConfig>(&raw) {
        Ok(mut config) => {
            config.normalize();
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Config unreadable, restoring defaults");
            let backup = path.with_extension("json.bak");
            let _ = fs::copy(path, backup);
            let config = BackendConfig::default();
            save(path, &config)?;
            Ok(config)
        }
    }
}

pub fn save(path: &Path, config: &BackendConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: dir.display().to_string(),
                source,
            })?;
        }
    }

    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}
