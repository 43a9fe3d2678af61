//! Environment-driven configuration for the embeddings engine.

use crate::errors::embedding_error::EmbeddingError;

/// Runtime configuration for embedding generation.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Embedding model identifier (e.g. "all-MiniLM-L6-v2").
    pub model: String,
    /// Expected vector dimensionality.
    pub dim: usize,
    /// Base URL of the local embeddings backend (Ollama-compatible).
    pub base_url: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".to_string(),
            dim: 384,
            base_url: "http://localhost:11434".to_string(),
        }
    }
}

impl EmbeddingConfig {
    /// Reads configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// - `EMBEDDINGS_MODEL` (default: `all-MiniLM-L6-v2`)
    /// - `EMBEDDINGS_DIM` (default: `384`)
    /// - `OLLAMA_URL` (default: `http://localhost:11434`)
    pub fn from_env() -> Result<Self, EmbeddingError> {
        let model = std::env::var("EMBEDDINGS_MODEL").unwrap_or_else(|_| "all-MiniLM-L6-v2".into());
        let dim = match std::env::var("EMBEDDINGS_DIM") {
            Ok(v) => v.parse::<usize>().map_err(|_| EmbeddingError::EnvParse {
                key: "EMBEDDINGS_DIM".into(),
                value: v,
            })?,
            Err(_) => 384,
        };
        let base_url = std::env::var("OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".into());

        if dim == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "EMBEDDINGS_DIM must be > 0".into(),
            ));
        }

        Ok(Self {
            model,
            dim,
            base_url,
        })
    }
}
