//! Error types and validation helpers for the LLM client.
//!
//! This module defines a focused set of configuration errors, the
//! provider-call error taxonomy, and small reusable helpers for
//! reading/validating environment variables.
//!
//! Config error messages keep the `[AI LLM Service]` prefix inherited from
//! the client's history; provider errors are plain, since they surface
//! through [`AiLlmError`]'s own `Display` impl instead.

use reqwest::StatusCode;
use thiserror::Error;

/// Backend this client talks to. Currently always the single configured
/// chat-completion endpoint; kept as an enum (rather than inlined into
/// every error message) so adding a second backend later doesn't change
/// the error shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Chat,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Chat => write!(f, "chat-completion"),
        }
    }
}

/// A truncated HTTP response body kept for diagnostics, never the full
/// payload (which may be arbitrarily large or contain echoed prompt text).
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub url: String,
    pub snippet: String,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} -> {}", self.status, self.url, self.snippet)
    }
}

/// What went wrong talking to a provider, independent of which provider.
#[derive(Debug, Clone)]
pub enum ProviderErrorKind {
    InvalidProvider,
    MissingApiKey,
    InvalidEndpoint(String),
    Decode(String),
    HttpStatus(HttpError),
    EmptyChoices,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderErrorKind::InvalidProvider => write!(f, "unsupported provider"),
            ProviderErrorKind::MissingApiKey => write!(f, "missing API key"),
            ProviderErrorKind::InvalidEndpoint(e) => write!(f, "invalid endpoint: {e}"),
            ProviderErrorKind::Decode(d) => write!(f, "decode error: {d}"),
            ProviderErrorKind::HttpStatus(h) => write!(f, "http error: {h}"),
            ProviderErrorKind::EmptyChoices => write!(f, "response contained no choices"),
        }
    }
}

/// A failed call to a provider: which provider, and why.
#[derive(Debug, Clone, Error)]
#[error("{provider} provider error: {kind}")]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

/// Top-level error for the LLM client.
///
/// Callers that need degraded-mode behavior (never surface an error to
/// the worker) should not propagate this type upward from the public
/// `analyze_*` methods — it exists for internal plumbing and for
/// [`crate::config::LlmConfig::from_env`].
#[derive(Debug, Error)]
pub enum AiLlmError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("http transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),
}

/// Truncates a response body to a bounded, log-friendly snippet.
pub fn make_snippet(text: &str) -> String {
    const MAX: usize = 300;
    if text.len() <= MAX {
        return text.to_string();
    }
    let mut end = MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

/// Convenient result alias for config and runtime operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Error enum for environment/config-driven setup.
///
/// Keep this focused: only errors that realistically happen at config
/// load/validation time. Extend conservatively as needs arise.
///
/// All variants include `[AI LLM Service]` in their messages.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `LLM_MAX_TOKENS`, `OLLAMA_PORT`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_KIND`.
    #[error("[AI LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `OLLAMA_URL`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[AI LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        /// Field name (e.g., `temperature`).
        field: &'static str,
        /// Description of the expected range (e.g., `expected 0.0..=1.0`).
        detail: &'static str,
    },

    /// Model name was empty or invalid.
    #[error("[AI LLM Service] model name must not be empty")]
    EmptyModel,

    /// Stop sequences contained one or more empty strings.
    #[error("[AI LLM Service] stop sequences must not contain empty strings")]
    InvalidStopSequence,
}

/* ------------------------ Env helpers ------------------------ */

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`ConfigError::MissingVar`] if the variable is absent or empty.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid `u32`.
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => {
            v.parse::<u32>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidNumber {
                    var: name,
                    reason: "expected u32",
                })
        }
        _ => Ok(None),
    }
}

/* --------------------- Validation helpers --------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the string does not start
/// with a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        })
    }
}

/// Validates that a floating-point value lies within an inclusive range.
///
/// Useful for parameters like `temperature` (e.g., `0.0..=2.0`) or
/// `top_p` (`0.0..=1.0`).
///
/// # Parameters
/// - `field`: Logical field name (e.g., `"top_p"`).
/// - `value`: The value to validate.
/// - `min`: Inclusive lower bound.
/// - `max`: Inclusive upper bound.
///
/// # Errors
/// Returns [`ConfigError::OutOfRange`] if `value` is outside `[min, max]`.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        })
    }
}

/// Ensures that a list of stop sequences is non-empty and contains no empty strings.
///
/// # Errors
/// Returns [`ConfigError::InvalidStopSequence`] if any element is an empty string.
pub fn validate_stop_sequences<S>(stops: &[S]) -> Result<()>
where
    S: AsRef<str>,
{
    if stops.iter().any(|s| s.as_ref().is_empty()) {
        Err(ConfigError::InvalidStopSequence)
    } else {
        Ok(())
    }
}
