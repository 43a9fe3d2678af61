//! Text-to-vector embedding, cosine similarity, and duplicate detection.
//!
//! Failure policy: any embedding failure (backend unreachable, model not
//! loaded, bad response) degrades to a zero vector rather than propagating
//! an error. Downstream similarity computations over zero vectors yield
//! `0.0`, so a dependency outage shows up as "no duplicates found" instead
//! of aborting the file's analysis.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::embedding_error::EmbeddingError;
use crate::structs::embedding_config::EmbeddingConfig;

const PREPROCESS_MAX_CHARS: usize = 512;
const METRICS_THRESHOLD: f32 = 0.7;
const STRICT_DUPLICATE_THRESHOLD: f32 = 0.8;

/// Aggregate duplication signal for one file, spliced into the quality
/// analysis result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityMetrics {
    pub total_blocks: usize,
    pub duplicates_found: usize,
    pub max_similarity: f32,
    pub avg_similarity: f32,
    pub duplication_score: f32,
}

impl SimilarityMetrics {
    fn zero() -> Self {
        Self {
            total_blocks: 0,
            duplicates_found: 0,
            max_similarity: 0.0,
            avg_similarity: 0.0,
            duplication_score: 0.0,
        }
    }
}

/// A dense-vector embedding engine backed by a local embeddings endpoint.
#[derive(Debug, Clone)]
pub struct EmbeddingEngine {
    http: reqwest::Client,
    cfg: EmbeddingConfig,
}

impl EmbeddingEngine {
    pub fn new(cfg: EmbeddingConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http, cfg }
    }

    /// Encodes one text into a fixed-dimension vector. Returns a zero
    /// vector if the backend is unavailable.
    pub async fn encode(&self, text: &str) -> Vec<f32> {
        let pre = preprocess_code(text);
        if pre.is_empty() {
            return vec![0.0; self.cfg.dim];
        }
        match self.embed_one(&pre).await {
            Ok(v) if v.len() == self.cfg.dim => v,
            Ok(v) => {
                warn!(
                    got = v.len(),
                    expected = self.cfg.dim,
                    "embedding dimension mismatch, falling back to zero vector"
                );
                vec![0.0; self.cfg.dim]
            }
            Err(e) => {
                warn!(error = %e, "embedding backend unavailable, falling back to zero vector");
                vec![0.0; self.cfg.dim]
            }
        }
    }

    /// Encodes many texts, preserving input order.
    pub async fn encode_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        let mut out = Vec::with_capacity(texts.len());
        for t in texts {
            out.push(self.encode(t).await);
        }
        out
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/api/embeddings", self.cfg.base_url);
        let req = OllamaEmbedRequest {
            model: &self.cfg.model,
            prompt: text,
        };
        let resp = self
            .http
            .post(&url)
            .json(&req)
            .send()
            .await
            .map_err(|e| EmbeddingError::Embedding(format!("POST {url}: {e}")))?;

        if resp.status() != reqwest::StatusCode::OK {
            let code = resp.status();
            return Err(EmbeddingError::Embedding(format!(
                "embeddings backend returned non-200: {code}"
            )));
        }

        let parsed: OllamaEmbedResponse = resp
            .json()
            .await
            .map_err(|e| EmbeddingError::Embedding(format!("parse embeddings json: {e}")))?;
        Ok(parsed.embedding)
    }

    /// Computes duplication metrics for a whole file: extracts blocks,
    /// encodes them, and reports pairwise similarity above the metrics
    /// threshold (0.7).
    pub async fn similarity_metrics(&self, file_content: &str) -> SimilarityMetrics {
        let blocks = extract_blocks(file_content);
        if blocks.is_empty() {
            return SimilarityMetrics::zero();
        }

        let vectors = self.encode_batch(&blocks).await;
        let pairs = detect_duplicates(&vectors, METRICS_THRESHOLD);

        if pairs.is_empty() {
            return SimilarityMetrics {
                total_blocks: blocks.len(),
                duplicates_found: 0,
                max_similarity: 0.0,
                avg_similarity: 0.0,
                duplication_score: 0.0,
            };
        }

        let max_similarity = pairs.iter().map(|(_, _, s)| *s).fold(0.0f32, f32::max);
        let avg_similarity = pairs.iter().map(|(_, _, s)| *s).sum::<f32>() / pairs.len() as f32;
        let duplication_score = duplication_ratio(pairs.len(), blocks.len());

        SimilarityMetrics {
            total_blocks: blocks.len(),
            duplicates_found: pairs.len(),
            max_similarity,
            avg_similarity,
            duplication_score,
        }
    }

    /// Detects strict duplicate pairs (threshold 0.8) across an arbitrary
    /// set of text blocks — used outside the per-file quality pipeline,
    /// e.g. for cross-file duplicate reporting.
    pub async fn detect_duplicates_in(&self, blocks: &[String], threshold: f32) -> Vec<(usize, usize, f32)> {
        let vectors = self.encode_batch(blocks).await;
        detect_duplicates(&vectors, threshold)
    }
}

/// Cosine similarity between two vectors, clamped to `[0, 1]`.
///
/// Returns `0.0` for mismatched lengths or zero-magnitude vectors (the
/// degraded-mode fallback vector included).
pub fn cosine_similarity(u: &[f32], v: &[f32]) -> f32 {
    if u.len() != v.len() || u.is_empty() {
        return 0.0;
    }
    let dot: f32 = u.iter().zip(v.iter()).map(|(a, b)| a * b).sum();
    let norm_u: f32 = u.iter().map(|a| a * a).sum::<f32>().sqrt();
    let norm_v: f32 = v.iter().map(|a| a * a).sum::<f32>().sqrt();
    if norm_u == 0.0 || norm_v == 0.0 {
        return 0.0;
    }
    (dot / (norm_u * norm_v)).clamp(0.0, 1.0)
}

/// Fraction of all possible block pairs that came back as duplicates,
/// i.e. `duplicate_pairs / (n choose 2)`, floored at a denominator of 1
/// so a single-block file scores 0 rather than dividing by zero.
fn duplication_ratio(duplicate_pairs: usize, total_blocks: usize) -> f32 {
    let possible_pairs = total_blocks * total_blocks.saturating_sub(1) / 2;
    (duplicate_pairs as f32 / possible_pairs.max(1) as f32).min(1.0)
}

/// Pairwise-compares `vectors` and returns `(i, j, score)` for every pair
/// scoring at or above `threshold`, `i < j`, sorted by score descending.
pub fn detect_duplicates(vectors: &[Vec<f32>], threshold: f32) -> Vec<(usize, usize, f32)> {
    let mut pairs = Vec::new();
    for i in 0..vectors.len() {
        for j in (i + 1)..vectors.len() {
            let score = cosine_similarity(&vectors[i], &vectors[j]);
            if score >= threshold {
                pairs.push((i, j, score));
            }
        }
    }
    pairs.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    pairs
}

/// The strict duplicate-pair threshold used outside per-file metrics.
pub const STRICT_THRESHOLD: f32 = STRICT_DUPLICATE_THRESHOLD;

/// Strips empty lines, collapses internal whitespace, and truncates to
/// 512 characters — the exact preprocessing applied before encoding.
pub fn preprocess_code(code: &str) -> String {
    let collapsed = code
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join(" ");

    if collapsed.len() <= PREPROCESS_MAX_CHARS {
        return collapsed;
    }
    let mut end = PREPROCESS_MAX_CHARS;
    while !collapsed.is_char_boundary(end) {
        end -= 1;
    }
    collapsed[..end].to_string()
}

/// Splits source into blocks at definition-like prefixes (`def `,
/// `class `, `function `, `const `, `let `, `var `). Each span runs until
/// the next such prefix or end of file.
pub fn extract_blocks(content: &str) -> Vec<String> {
    const PREFIXES: [&str; 6] = ["def ", "class ", "function ", "const ", "let ", "var "];

    let mut blocks = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        let trimmed = line.trim_start();
        let starts_block = PREFIXES.iter().any(|p| trimmed.starts_with(p));
        if starts_block && !current.trim().is_empty() {
            blocks.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        blocks.push(current);
    }

    if blocks.is_empty() && !content.trim().is_empty() {
        blocks.push(content.to_string());
    }
    blocks
}

#[derive(Debug, Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_is_one_for_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_zero_for_zero_vector() {
        let zero = vec![0.0, 0.0, 0.0];
        let other = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &other), 0.0);
    }

    #[test]
    fn detect_duplicates_orders_pairs_by_score_desc_with_i_lt_j() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.01];
        let c = vec![0.0, 1.0];
        let pairs = detect_duplicates(&[a, b, c], 0.5);
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].0, pairs[0].1), (0, 1));
    }

    #[test]
    fn preprocess_truncates_to_512_chars() {
        let long = "let x = 1;\n".repeat(200);
        let out = preprocess_code(&long);
        assert!(out.len() <= 512);
    }

    #[test]
    fn extract_blocks_splits_on_definitions() {
        let src = "def a():\n    pass\ndef b():\n    pass\n";
        let blocks = extract_blocks(src);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn extract_blocks_empty_file_yields_no_blocks() {
        assert!(extract_blocks("").is_empty());
    }

    #[test]
    fn duplication_ratio_divides_by_total_possible_pairs() {
        // 4 blocks -> 6 possible pairs, 2 duplicates -> 1/3, not 2/4.
        assert!((duplication_ratio(2, 4) - (1.0 / 3.0)).abs() < 1e-6);
    }

    #[test]
    fn duplication_ratio_single_block_is_zero() {
        assert_eq!(duplication_ratio(0, 1), 0.0);
    }
}
