//! Local embeddings backend client used for duplicate-code detection.
//!
//! Everything here degrades instead of failing: a missing or unreachable
//! embeddings backend yields zero vectors, which in turn yield zero
//! similarity scores. The file analyzer never sees an error from this
//! crate; it sees "no duplicates found".

pub mod engine;
pub mod errors;
pub mod structs;

pub use engine::{
    cosine_similarity, detect_duplicates, extract_blocks, preprocess_code, EmbeddingEngine,
    SimilarityMetrics, STRICT_THRESHOLD,
};
pub use errors::embedding_error::EmbeddingError;
pub use structs::embedding_config::EmbeddingConfig;
