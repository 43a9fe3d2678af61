//! Error hierarchy for the code-host client.
//!
//! Goals:
//! - Single root `Error` for all public functions.
//! - Status-aware mapping (401→Unauthorized, 403→Forbidden, 404→NotFound,
//!   429→RateLimited, 5xx→Server) so callers can branch without inspecting
//!   HTTP details.
//! - No dynamic dispatch, no async-trait, ergonomic `?` via `From` impls.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type HostResult<T> = Result<T, Error>;

/// Root error type for the code-host crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Upstream API failure (network, status, decode).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Bad configuration (missing token, malformed base URL).
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Status-aware provider failure, independent of transport details.
#[derive(Debug, Error, Clone)]
pub enum ProviderError {
    /// HTTP 401.
    #[error("unauthorized")]
    Unauthorized,

    /// HTTP 403.
    #[error("forbidden")]
    Forbidden,

    /// HTTP 404 — PR or file absent.
    #[error("not found")]
    NotFound,

    /// HTTP 429, with a retry-after hint when the server supplied one.
    #[error("rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    /// HTTP 5xx.
    #[error("server error: status {0}")]
    Server(u16),

    /// Any other non-success status.
    #[error("http status error: {0}")]
    HttpStatus(u16),

    /// Transport-level timeout.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without a status (DNS, connect, reset).
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Configuration and setup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing code host token")]
    MissingToken,

    #[error("invalid base api url: {0}")]
    InvalidBaseUrl(String),

    #[error("submission url does not match a supported code host: {0}")]
    UnrecognizedRepoUrl(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Provider(ProviderError::from(e))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return ProviderError::Timeout;
        }
        if let Some(status) = e.status() {
            let code = status.as_u16();
            return match code {
                401 => ProviderError::Unauthorized,
                403 => ProviderError::Forbidden,
                404 => ProviderError::NotFound,
                429 => ProviderError::RateLimited {
                    retry_after_secs: None,
                },
                500..=599 => ProviderError::Server(code),
                _ => ProviderError::HttpStatus(code),
            };
        }
        ProviderError::Network(e.to_string())
    }
}
