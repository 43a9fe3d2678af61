use std::sync::Arc;

use repository_store::PgRepository;
use sqlx::PgPool;
use task_queue::RedisQueue;

/// Shared state for the submission/status/results handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<PgRepository>,
    pub pool: PgPool,
    pub queue: Arc<RedisQueue>,
}
