//! Provider configuration.
//!
//! - `TOOLCALL_API_KEY`: API key, falling back to `OPENAI_API_KEY` (required)
//! - `TOOLCALL_BASE_URL`: base URL (default `https://open.bigmodel.cn/api/paas/v4`)
//! - `TOOLCALL_MODEL`: default model (default `glm-4.6`)
//! - `TOOLCALL_TIMEOUT_SECS`: request timeout (default 60)
//! - `TOOLCALL_TEMPERATURE`: default temperature (default 0.7)
//! - `TOOLCALL_MAX_TOKENS`: default max tokens (default 4096)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::llm::openai::DEFAULT_BASE_URL;
use crate::llm::{CompletionClientBuilder, CompletionProvider, ProviderError};

const DEFAULT_MODEL: &str = "glm-4.6";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API key not configured; set TOOLCALL_API_KEY or OPENAI_API_KEY")]
    MissingApiKey,
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Connection and sampling settings for the completion provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            default_model: default_model(),
            timeout: default_timeout(),
            default_temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns a variable's value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("TOOLCALL_API_KEY")
            .or_else(|| non_empty("OPENAI_API_KEY"))
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = non_empty("TOOLCALL_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(model) = non_empty("TOOLCALL_MODEL") {
            config.default_model = model;
        }
        if let Some(secs) = parse_var::<u64>("TOOLCALL_TIMEOUT_SECS", non_empty("TOOLCALL_TIMEOUT_SECS"))? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(temperature) =
            parse_var::<f32>("TOOLCALL_TEMPERATURE", non_empty("TOOLCALL_TEMPERATURE"))?
        {
            if !(0.0..=1.0).contains(&temperature) {
                return Err(ConfigError::InvalidValue {
                    name: "TOOLCALL_TEMPERATURE",
                    value: temperature.to_string(),
                });
            }
            config.default_temperature = temperature;
        }
        if let Some(max_tokens) = parse_var::<u32>("TOOLCALL_MAX_TOKENS", non_empty("TOOLCALL_MAX_TOKENS"))? {
            config.max_tokens = max_tokens;
        }

        Ok(config)
    }

    /// Defaults the orchestrator applies to requests that leave them unset.
    pub fn chat_defaults(&self) -> ChatDefaults {
        ChatDefaults {
            model: self.default_model.clone(),
            temperature: self.default_temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Builds the provider client this configuration describes.
    pub fn build_client(&self) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
        CompletionClientBuilder::new()
            .with_api_key(&self.api_key)
            .with_base_url(&self.base_url)
            .with_timeout(self.timeout)
            .build()
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .field("default_temperature", &self.default_temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

fn parse_var<T: FromStr>(name: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidValue { name, value: v })
        })
        .transpose()
}

/// Sampling defaults for chat turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatDefaults {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatDefaults {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Masks an API key for logging: first 6 and last 4 characters are kept.
pub fn mask_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() < 10 {
        return "****".to_string();
    }

    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}
