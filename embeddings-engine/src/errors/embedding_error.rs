//! Unified error type for the embeddings engine.

use thiserror::Error;

/// Errors produced by the embeddings engine.
///
/// None of these are meant to abort a file's analysis: per the failure
/// policy in `encode`/`similarity_metrics`, callers degrade to a zero
/// vector or zero-valued metrics rather than propagate this type further
/// up the pipeline.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Required environment variable is missing.
    #[error("missing env variable: {key}")]
    EnvMissing { key: String },

    /// Failed to parse an environment variable into the expected type.
    #[error("failed to parse env variable: {key} = '{value}'")]
    EnvParse { key: String, value: String },

    /// Configuration combination is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Embedding backend failed to initialize or to embed inputs.
    #[error("embedding error: {0}")]
    Embedding(String),
}
