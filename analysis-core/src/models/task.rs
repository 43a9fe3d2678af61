//! The `Task` entity: a client's request to analyze one pull request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Advisory queue priority. Never affects correctness, only scheduling
/// order within the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Normal
    }
}

/// Task lifecycle status. Transitions form a DAG: see [`Task::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Retry,
}

impl TaskStatus {
    /// `completed`, `failed`, and `cancelled` are terminal: `completed_at`
    /// must be set and no further transition is permitted.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// A client's request to analyze a PR, and the durable record of its
/// execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub repo_url: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub pr_number: u64,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub progress: u8,
    pub queue_ticket_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub config: serde_json::Value,
    pub error_message: Option<String>,
    pub error_details: Option<serde_json::Value>,
}

impl Task {
    /// Creates a new task in `pending` status with `progress == 0`, as
    /// required of the submission collaborator.
    pub fn new(
        id: String,
        repo_url: String,
        repo_owner: String,
        repo_name: String,
        pr_number: u64,
        priority: TaskPriority,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            repo_url,
            repo_owner,
            repo_name,
            pr_number,
            priority,
            status: TaskStatus::Pending,
            progress: 0,
            queue_ticket_id: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            retry_count: 0,
            max_retries: 3,
            config: serde_json::Value::Null,
            error_message: None,
            error_details: None,
        }
    }

    /// Sets progress, enforcing the monotonic-non-decreasing guarantee
    /// from the concurrency model. Returns `false` (no-op) if `new_progress`
    /// would regress.
    pub fn set_progress(&mut self, new_progress: u8) -> bool {
        let clamped = new_progress.min(100);
        if clamped < self.progress {
            return false;
        }
        self.progress = clamped;
        self.updated_at = Utc::now();
        true
    }

    /// Marks the task `processing`, stamping `started_at` on first entry.
    pub fn mark_processing(&mut self) {
        self.status = TaskStatus::Processing;
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        self.updated_at = Utc::now();
    }

    /// Marks the task `completed`: `progress == 100` and `completed_at`
    /// set, matching both invariants simultaneously.
    pub fn mark_completed(&mut self) {
        self.status = TaskStatus::Completed;
        self.progress = 100;
        let now = Utc::now();
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    /// Marks the task `failed` with a reason. Terminal; `completed_at` is
    /// set even though the task did not succeed.
    pub fn mark_failed(&mut self, message: impl Into<String>, details: Option<serde_json::Value>) {
        self.status = TaskStatus::Failed;
        self.error_message = Some(message.into());
        self.error_details = details;
        let now = Utc::now();
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    /// Marks the task `cancelled`. Terminal; wins any race with a later
    /// success observation (callers must check status before writing a
    /// completed transition).
    pub fn mark_cancelled(&mut self) {
        self.status = TaskStatus::Cancelled;
        let now = Utc::now();
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    /// Attempts to enter the retry path. Returns `false` if `retry_count`
    /// has already reached `max_retries` — the caller must then call
    /// [`Task::mark_failed`] instead.
    pub fn try_retry(&mut self) -> bool {
        self.try_retry_capped(self.max_retries)
    }

    /// Like [`Task::try_retry`] but against an explicit cap instead of
    /// `max_retries` — used for error classes with their own retry
    /// budget (e.g. database errors get one retry regardless of how many
    /// attempts the task's general policy would otherwise allow).
    pub fn try_retry_capped(&mut self, cap: u32) -> bool {
        if self.retry_count >= cap {
            return false;
        }
        self.retry_count += 1;
        self.status = TaskStatus::Retry;
        self.updated_at = Utc::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_implies_progress_100() {
        let mut t = Task::new("t1".into(), "u".into(), "o".into(), "r".into(), 1, TaskPriority::Normal);
        t.mark_completed();
        assert_eq!(t.progress, 100);
        assert!(t.completed_at.is_some());
    }

    #[test]
    fn progress_never_regresses() {
        let mut t = Task::new("t1".into(), "u".into(), "o".into(), "r".into(), 1, TaskPriority::Normal);
        assert!(t.set_progress(50));
        assert!(!t.set_progress(30));
        assert_eq!(t.progress, 50);
    }

    #[test]
    fn retry_exhausted_after_max_retries() {
        let mut t = Task::new("t1".into(), "u".into(), "o".into(), "r".into(), 1, TaskPriority::Normal);
        t.max_retries = 1;
        assert!(t.try_retry());
        assert!(!t.try_retry());
    }

    #[test]
    fn capped_retry_ignores_the_higher_general_policy() {
        let mut t = Task::new("t1".into(), "u".into(), "o".into(), "r".into(), 1, TaskPriority::Normal);
        assert_eq!(t.max_retries, 3);
        assert!(t.try_retry_capped(1));
        assert!(!t.try_retry_capped(1));
    }
}
