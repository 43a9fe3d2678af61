//! Error taxonomy for the analysis core, per the error-handling design.
//!
//! `LLMUnavailable` and `DuplicateDetectorUnavailable` are deliberately
//! absent: those are absorbed inside `llm-client`/`embeddings-engine` and
//! never surface this far, per the degraded-mode contract.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limited, retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("task exceeded its wall-clock budget")]
    TaskTimeout,

    #[error("file analysis failed for {path}: {reason}")]
    FileAnalysis { path: String, reason: String },
}

impl AnalysisError {
    /// `true` for errors that are fatal for the whole task (cannot
    /// proceed, skips the retry path) rather than per-file or absorbed.
    pub fn is_task_fatal(&self) -> bool {
        matches!(
            self,
            AnalysisError::Unauthorized(_)
                | AnalysisError::NotFound(_)
                | AnalysisError::TaskTimeout
        )
    }

    /// Retry budget this error class gets, overriding the task's general
    /// `max_retries` policy. `Database` failures get one retry and then
    /// go fatal. `None` means "use the task's own `max_retries`".
    pub fn retry_cap(&self) -> Option<u32> {
        match self {
            AnalysisError::Database(_) => Some(1),
            _ => None,
        }
    }
}

impl From<code_host::Error> for AnalysisError {
    fn from(err: code_host::Error) -> Self {
        use code_host::{Error, ProviderError};
        match err {
            Error::Provider(ProviderError::Unauthorized | ProviderError::Forbidden) => {
                AnalysisError::Unauthorized(err.to_string())
            }
            Error::Provider(ProviderError::NotFound) => AnalysisError::NotFound(err.to_string()),
            Error::Provider(ProviderError::RateLimited { retry_after_secs }) => {
                AnalysisError::RateLimited { retry_after_secs }
            }
            other => AnalysisError::Upstream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_get_a_one_retry_cap() {
        assert_eq!(AnalysisError::Database("x".into()).retry_cap(), Some(1));
        assert!(!AnalysisError::Database("x".into()).is_task_fatal());
    }

    #[test]
    fn other_errors_defer_to_the_task_s_general_policy() {
        assert_eq!(AnalysisError::Upstream("x".into()).retry_cap(), None);
        assert_eq!(AnalysisError::RateLimited { retry_after_secs: None }.retry_cap(), None);
    }

    #[test]
    fn unauthorized_not_found_and_timeout_are_task_fatal() {
        assert!(AnalysisError::Unauthorized("x".into()).is_task_fatal());
        assert!(AnalysisError::NotFound("x".into()).is_task_fatal());
        assert!(AnalysisError::TaskTimeout.is_task_fatal());
    }
}
