//! Chat-completion LLM client.
//!
//! Exposes the three prompted analyses the file analyzer needs
//! (quality, security, suggestions) against a single configured
//! OpenAI-compatible endpoint, with a degraded mode that returns canned
//! responses instead of propagating an error when the backend is
//! unreachable or unconfigured.

pub mod client;
pub mod config;
pub mod error;
pub mod prompts;

pub use client::LlmClient;
pub use config::LlmConfig;
pub use error::{AiLlmError, ConfigError, HttpError, Provider, ProviderError, ProviderErrorKind};
pub use prompts::{IssueRecord, QualityMetrics, QualityReport, SuggestionRecord};
