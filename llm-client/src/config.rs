//! Environment-driven configuration for the LLM client.

use crate::error::{must_env, validate_http_endpoint, validate_range_f32, ConfigError};

/// Runtime configuration for the chat-completion backend.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Endpoint base URL, e.g. `https://api.openai.com`.
    pub base_url: String,
    /// Bearer token. Absence puts the client into degraded mode rather
    /// than failing construction.
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    /// Reads configuration from environment variables.
    ///
    /// - `LLM_BASE_URL` (required, must start with `http://`/`https://`)
    /// - `LLM_MODEL` (required)
    /// - `LLM_API_KEY` (optional — unset means degraded mode)
    /// - `LLM_TEMPERATURE` (default `0.1`, must be in `0.0..=2.0`)
    /// - `LLM_MAX_TOKENS` (default `4000`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = must_env("LLM_BASE_URL")?;
        validate_http_endpoint("LLM_BASE_URL", &base_url)?;

        let model = must_env("LLM_MODEL")?;

        let api_key = std::env::var("LLM_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let temperature = match std::env::var("LLM_TEMPERATURE") {
            Ok(v) if !v.trim().is_empty() => v.parse::<f32>().map_err(|_| ConfigError::InvalidNumber {
                var: "LLM_TEMPERATURE",
                reason: "expected f32",
            })?,
            _ => 0.1,
        };
        validate_range_f32("temperature", temperature, 0.0, 2.0)?;

        let max_tokens = match std::env::var("LLM_MAX_TOKENS") {
            Ok(v) if !v.trim().is_empty() => v.parse::<u32>().map_err(|_| ConfigError::InvalidNumber {
                var: "LLM_MAX_TOKENS",
                reason: "expected u32",
            })?,
            _ => 4000,
        };

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            temperature,
            max_tokens,
        })
    }

    /// `true` when no API key is configured — callers should route through
    /// canned degraded-mode responses instead of calling the backend.
    pub fn is_degraded(&self) -> bool {
        self.api_key.is_none()
    }
}
