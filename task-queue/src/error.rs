use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("redis pool creation error: {0}")]
    PoolCreate(#[from] deadpool_redis::CreatePoolError),

    #[error("ticket not found: {0}")]
    TicketNotFound(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<QueueError> for analysis_core::AnalysisError {
    fn from(err: QueueError) -> Self {
        analysis_core::AnalysisError::Upstream(err.to_string())
    }
}
