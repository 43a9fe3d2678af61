//! Redis-backed task queue: one list per priority class as the FIFO
//! channel, a per-ticket hash for status/progress, and a sorted set
//! tracking claimed-but-unacknowledged tickets for visibility-timeout
//! redelivery.

use chrono::Utc;
use deadpool_redis::{redis::AsyncCommands, Pool, Runtime};
use tracing::{info, warn};
use uuid::Uuid;

use analysis_core::{AnalysisError, Queue, TaskPriority, TerminalOutcome};

use crate::config::QueueConfig;
use crate::error::QueueError;

const PRIORITY_ORDER: [TaskPriority; 4] = [
    TaskPriority::Urgent,
    TaskPriority::High,
    TaskPriority::Normal,
    TaskPriority::Low,
];

fn priority_key(p: TaskPriority) -> &'static str {
    match p {
        TaskPriority::Low => "queue:list:low",
        TaskPriority::Normal => "queue:list:normal",
        TaskPriority::High => "queue:list:high",
        TaskPriority::Urgent => "queue:list:urgent",
    }
}

fn priority_from_key(key: &str) -> TaskPriority {
    match key {
        "queue:list:low" => TaskPriority::Low,
        "queue:list:high" => TaskPriority::High,
        "queue:list:urgent" => TaskPriority::Urgent,
        _ => TaskPriority::Normal,
    }
}

fn ticket_hash_key(ticket_id: &str) -> String {
    format!("queue:ticket:{ticket_id}")
}

const VISIBILITY_SET_KEY: &str = "queue:visibility";

/// A ticket claimed off the queue, ready to be handed to the worker.
#[derive(Debug, Clone)]
pub struct ClaimedTicket {
    pub ticket_id: String,
    pub task_id: String,
}

pub struct RedisQueue {
    pool: Pool,
    cfg: QueueConfig,
}

impl RedisQueue {
    pub fn connect(cfg: QueueConfig) -> Result<Self, QueueError> {
        let redis_cfg = deadpool_redis::Config::from_url(&cfg.redis_url);
        let pool = redis_cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool, cfg })
    }

    /// Enqueues a new task submission, returning the queue-ticket id.
    pub async fn submit(&self, task_id: &str, priority: TaskPriority) -> Result<String, QueueError> {
        let ticket_id = Uuid::new_v4().to_string();
        let mut conn = self.pool.get().await?;

        let hash_key = ticket_hash_key(&ticket_id);
        let now = Utc::now().to_rfc3339();
        let () = conn
            .hset_multiple(
                &hash_key,
                &[
                    ("task_id", task_id.to_string()),
                    ("status", "queued".to_string()),
                    ("priority", priority_key(priority).to_string()),
                    ("progress", "null".to_string()),
                    ("submitted_at", now),
                ],
            )
            .await?;
        let _: () = conn.rpush(priority_key(priority), &ticket_id).await?;

        info!(task_id, ticket_id, "task submitted to queue");
        Ok(ticket_id)
    }

    /// Blocks (up to `claim_block_secs`) for the next ticket, checking
    /// priority lists from highest to lowest. Returns `None` on timeout so
    /// callers can loop and also run [`Self::recover_expired`] between
    /// polls.
    pub async fn claim(&self) -> Result<Option<ClaimedTicket>, QueueError> {
        let mut conn = self.pool.get().await?;
        let keys: Vec<&str> = PRIORITY_ORDER.iter().copied().map(priority_key).collect();

        let popped: Option<(String, String)> = conn.blpop(&keys, self.cfg.claim_block_secs as f64).await?;
        let Some((_list_key, ticket_id)) = popped else {
            return Ok(None);
        };

        let hash_key = ticket_hash_key(&ticket_id);
        let task_id: Option<String> = conn.hget(&hash_key, "task_id").await?;
        let Some(task_id) = task_id else {
            warn!(ticket_id, "claimed ticket has no hash entry, dropping");
            return Ok(None);
        };

        let deadline = Utc::now().timestamp() + self.cfg.visibility_timeout_secs;
        let _: () = conn
            .hset_multiple(
                &hash_key,
                &[("status", "claimed".to_string()), ("claimed_at", Utc::now().to_rfc3339())],
            )
            .await?;
        let _: () = conn.zadd(VISIBILITY_SET_KEY, &ticket_id, deadline).await?;

        Ok(Some(ClaimedTicket { ticket_id, task_id }))
    }

    /// Sweeps the visibility sorted set for tickets whose deadline has
    /// passed without a terminal ack, and redelivers them onto their
    /// original priority list. Returns the number of tickets redelivered.
    pub async fn recover_expired(&self) -> Result<usize, QueueError> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now().timestamp();
        let expired: Vec<String> = conn.zrangebyscore(VISIBILITY_SET_KEY, 0, now).await?;

        for ticket_id in &expired {
            let hash_key = ticket_hash_key(ticket_id);
            let priority_str: Option<String> = conn.hget(&hash_key, "priority").await?;
            let Some(priority_str) = priority_str else {
                let _: () = conn.zrem(VISIBILITY_SET_KEY, ticket_id).await?;
                continue;
            };
            let priority = priority_from_key(&priority_str);

            let _: () = conn.rpush(priority_key(priority), ticket_id).await?;
            let _: () = conn.hset(&hash_key, "status", "queued").await?;
            let _: () = conn.zrem(VISIBILITY_SET_KEY, ticket_id).await?;
            warn!(ticket_id, "visibility timeout expired, redelivering ticket");
        }

        Ok(expired.len())
    }

    pub async fn ticket_status(&self, ticket_id: &str) -> Result<Option<String>, QueueError> {
        let mut conn = self.pool.get().await?;
        let status: Option<String> = conn.hget(ticket_hash_key(ticket_id), "status").await?;
        Ok(status)
    }
}

impl Queue for RedisQueue {
    async fn update_progress(&self, ticket_id: &str, payload: serde_json::Value) -> Result<(), AnalysisError> {
        let mut conn = self.pool.get().await.map_err(QueueError::from)?;
        let _: () = conn
            .hset(ticket_hash_key(ticket_id), "progress", payload.to_string())
            .await
            .map_err(QueueError::from)?;
        Ok(())
    }

    async fn mark_terminal(
        &self,
        ticket_id: &str,
        outcome: TerminalOutcome,
        info: serde_json::Value,
    ) -> Result<(), AnalysisError> {
        let mut conn = self.pool.get().await.map_err(QueueError::from)?;
        let hash_key = ticket_hash_key(ticket_id);

        match outcome {
            TerminalOutcome::Success | TerminalOutcome::Failure => {
                let status = if outcome == TerminalOutcome::Success { "completed" } else { "failed" };
                let _: () = conn
                    .hset_multiple(&hash_key, &[("status", status.to_string()), ("info", info.to_string())])
                    .await
                    .map_err(QueueError::from)?;
                let _: () = conn.zrem(VISIBILITY_SET_KEY, ticket_id).await.map_err(QueueError::from)?;
            }
            TerminalOutcome::Retry => {
                let priority_str: Option<String> = conn.hget(&hash_key, "priority").await.map_err(QueueError::from)?;
                let priority = priority_str.as_deref().map(priority_from_key).unwrap_or(TaskPriority::Normal);
                let _: () = conn.rpush(priority_key(priority), ticket_id).await.map_err(QueueError::from)?;
                let _: () = conn
                    .hset_multiple(&hash_key, &[("status", "queued".to_string()), ("info", info.to_string())])
                    .await
                    .map_err(QueueError::from)?;
                let _: () = conn.zrem(VISIBILITY_SET_KEY, ticket_id).await.map_err(QueueError::from)?;
            }
        }

        Ok(())
    }
}
