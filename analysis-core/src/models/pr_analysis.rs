//! The `PRAnalysis` entity: the 1:1 analytical record attached to a Task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAnalysisStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
    pub info: u32,
}

impl SeverityCounts {
    pub fn total(&self) -> u32 {
        self.critical + self.high + self.medium + self.low + self.info
    }
}

/// Scores are either all set (on completed) or all `None` (on
/// in-progress/failed).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PrScores {
    pub quality: f32,
    pub maintainability: f32,
    pub complexity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrAnalysis {
    pub id: String,
    pub task_id: String,
    pub pr_url: String,
    pub base_branch: String,
    pub head_branch: String,
    pub base_sha: String,
    pub head_sha: String,
    pub status: PrAnalysisStatus,
    pub analysis_started_at: Option<DateTime<Utc>>,
    pub analysis_completed_at: Option<DateTime<Utc>>,
    pub files_analyzed: u32,
    pub lines_analyzed: u32,
    pub issues_found: u32,
    pub severity_counts: SeverityCounts,
    pub scores: Option<PrScores>,
    pub summary: Option<String>,
    pub recommendations: Vec<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrAnalysis {
    pub fn new(id: String, task_id: String, pr_url: String, base_branch: String, head_branch: String, base_sha: String, head_sha: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            task_id,
            pr_url,
            base_branch,
            head_branch,
            base_sha,
            head_sha,
            status: PrAnalysisStatus::Pending,
            analysis_started_at: None,
            analysis_completed_at: None,
            files_analyzed: 0,
            lines_analyzed: 0,
            issues_found: 0,
            severity_counts: SeverityCounts::default(),
            scores: None,
            summary: None,
            recommendations: Vec::new(),
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_in_progress(&mut self) {
        self.status = PrAnalysisStatus::InProgress;
        self.analysis_started_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    /// `issues_found == Σ per-severity counts` always holds after this
    /// call.
    pub fn set_severity_counts(&mut self, counts: SeverityCounts) {
        self.issues_found = counts.total();
        self.severity_counts = counts;
        self.updated_at = Utc::now();
    }

    pub fn mark_completed(&mut self, scores: PrScores, summary: String, recommendations: Vec<String>) {
        self.status = PrAnalysisStatus::Completed;
        self.scores = Some(scores);
        self.summary = Some(summary);
        self.recommendations = recommendations;
        self.analysis_completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = PrAnalysisStatus::Failed;
        self.error_message = Some(message.into());
        self.analysis_completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_counts_sum_matches_issues_found() {
        let mut pr = PrAnalysis::new("p1".into(), "t1".into(), "url".into(), "main".into(), "feat".into(), "a".into(), "b".into());
        pr.set_severity_counts(SeverityCounts { critical: 1, high: 2, medium: 0, low: 3, info: 0 });
        assert_eq!(pr.issues_found, 6);
    }
}
