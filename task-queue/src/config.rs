//! Environment-driven configuration for the Redis-backed queue.

use std::env;

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub redis_url: String,
    /// How long a claimed ticket stays invisible to other claimers before
    /// it is considered abandoned and redelivered.
    pub visibility_timeout_secs: i64,
    /// `BLPOP` timeout per `claim()` poll, in seconds.
    pub claim_block_secs: u32,
}

impl QueueConfig {
    pub fn from_env() -> Self {
        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let visibility_timeout_secs = env::var("QUEUE_VISIBILITY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(600);
        let claim_block_secs = env::var("QUEUE_CLAIM_BLOCK_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        Self {
            redis_url,
            visibility_timeout_secs,
            claim_block_secs,
        }
    }
}
