//! Flat row types and the enum<->TEXT mappings backing them. Kept as
//! plain `sqlx::query`/`query_as` rather than the `query!` macros so the
//! crate compiles without a live `DATABASE_URL` at build time.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use analysis_core::{
    FileAnalysis, FileAnalysisStatus, Issue, IssueType, PrAnalysis, PrAnalysisStatus, PrScores,
    Severity, SeverityCounts, Task, TaskPriority, TaskStatus,
};

pub fn priority_to_str(p: TaskPriority) -> &'static str {
    match p {
        TaskPriority::Low => "low",
        TaskPriority::Normal => "normal",
        TaskPriority::High => "high",
        TaskPriority::Urgent => "urgent",
    }
}

pub fn priority_from_str(s: &str) -> TaskPriority {
    match s {
        "low" => TaskPriority::Low,
        "high" => TaskPriority::High,
        "urgent" => TaskPriority::Urgent,
        _ => TaskPriority::Normal,
    }
}

pub fn task_status_to_str(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::Pending => "pending",
        TaskStatus::Processing => "processing",
        TaskStatus::Completed => "completed",
        TaskStatus::Failed => "failed",
        TaskStatus::Cancelled => "cancelled",
        TaskStatus::Retry => "retry",
    }
}

pub fn task_status_from_str(s: &str) -> TaskStatus {
    match s {
        "processing" => TaskStatus::Processing,
        "completed" => TaskStatus::Completed,
        "failed" => TaskStatus::Failed,
        "cancelled" => TaskStatus::Cancelled,
        "retry" => TaskStatus::Retry,
        _ => TaskStatus::Pending,
    }
}

pub fn pr_status_to_str(s: PrAnalysisStatus) -> &'static str {
    match s {
        PrAnalysisStatus::Pending => "pending",
        PrAnalysisStatus::InProgress => "in_progress",
        PrAnalysisStatus::Completed => "completed",
        PrAnalysisStatus::Failed => "failed",
    }
}

pub fn pr_status_from_str(s: &str) -> PrAnalysisStatus {
    match s {
        "in_progress" => PrAnalysisStatus::InProgress,
        "completed" => PrAnalysisStatus::Completed,
        "failed" => PrAnalysisStatus::Failed,
        _ => PrAnalysisStatus::Pending,
    }
}

pub fn file_status_to_str(s: FileAnalysisStatus) -> &'static str {
    match s {
        FileAnalysisStatus::Pending => "pending",
        FileAnalysisStatus::Completed => "completed",
        FileAnalysisStatus::Failed => "failed",
    }
}

pub fn file_status_from_str(s: &str) -> FileAnalysisStatus {
    match s {
        "completed" => FileAnalysisStatus::Completed,
        "failed" => FileAnalysisStatus::Failed,
        _ => FileAnalysisStatus::Pending,
    }
}

pub fn issue_type_to_str(t: IssueType) -> &'static str {
    match t {
        IssueType::Style => "style",
        IssueType::Bug => "bug",
        IssueType::Performance => "performance",
        IssueType::Security => "security",
        IssueType::BestPractice => "best_practice",
        IssueType::Complexity => "complexity",
        IssueType::Maintainability => "maintainability",
        IssueType::Documentation => "documentation",
    }
}

pub fn issue_type_from_str(s: &str) -> IssueType {
    IssueType::normalize(s)
}

pub fn severity_to_str(s: Severity) -> &'static str {
    match s {
        Severity::Info => "info",
        Severity::Low => "low",
        Severity::Medium => "medium",
        Severity::High => "high",
        Severity::Critical => "critical",
    }
}

pub fn severity_from_str(s: &str) -> Severity {
    Severity::normalize(s)
}

#[derive(Debug, FromRow)]
pub struct TaskRow {
    pub id: String,
    pub repo_url: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub pr_number: i64,
    pub priority: String,
    pub status: String,
    pub progress: i16,
    pub queue_ticket_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub config: serde_json::Value,
    pub error_message: Option<String>,
    pub error_details: Option<serde_json::Value>,
}

impl From<TaskRow> for Task {
    fn from(r: TaskRow) -> Self {
        Task {
            id: r.id,
            repo_url: r.repo_url,
            repo_owner: r.repo_owner,
            repo_name: r.repo_name,
            pr_number: r.pr_number as u64,
            priority: priority_from_str(&r.priority),
            status: task_status_from_str(&r.status),
            progress: r.progress as u8,
            queue_ticket_id: r.queue_ticket_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
            started_at: r.started_at,
            completed_at: r.completed_at,
            retry_count: r.retry_count as u32,
            max_retries: r.max_retries as u32,
            config: r.config,
            error_message: r.error_message,
            error_details: r.error_details,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PrAnalysisRow {
    pub id: String,
    pub task_id: String,
    pub pr_url: String,
    pub base_branch: String,
    pub head_branch: String,
    pub base_sha: String,
    pub head_sha: String,
    pub status: String,
    pub analysis_started_at: Option<DateTime<Utc>>,
    pub analysis_completed_at: Option<DateTime<Utc>>,
    pub files_analyzed: i32,
    pub lines_analyzed: i32,
    pub issues_found: i32,
    pub severity_critical: i32,
    pub severity_high: i32,
    pub severity_medium: i32,
    pub severity_low: i32,
    pub severity_info: i32,
    pub score_quality: Option<f32>,
    pub score_maintainability: Option<f32>,
    pub score_complexity: Option<f32>,
    pub summary: Option<String>,
    pub recommendations: serde_json::Value,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PrAnalysisRow> for PrAnalysis {
    fn from(r: PrAnalysisRow) -> Self {
        let scores = match (r.score_quality, r.score_maintainability, r.score_complexity) {
            (Some(quality), Some(maintainability), Some(complexity)) => Some(PrScores {
                quality,
                maintainability,
                complexity,
            }),
            _ => None,
        };
        PrAnalysis {
            id: r.id,
            task_id: r.task_id,
            pr_url: r.pr_url,
            base_branch: r.base_branch,
            head_branch: r.head_branch,
            base_sha: r.base_sha,
            head_sha: r.head_sha,
            status: pr_status_from_str(&r.status),
            analysis_started_at: r.analysis_started_at,
            analysis_completed_at: r.analysis_completed_at,
            files_analyzed: r.files_analyzed as u32,
            lines_analyzed: r.lines_analyzed as u32,
            issues_found: r.issues_found as u32,
            severity_counts: SeverityCounts {
                critical: r.severity_critical as u32,
                high: r.severity_high as u32,
                medium: r.severity_medium as u32,
                low: r.severity_low as u32,
                info: r.severity_info as u32,
            },
            scores,
            summary: r.summary,
            recommendations: serde_json::from_value(r.recommendations).unwrap_or_default(),
            error_message: r.error_message,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct FileAnalysisRow {
    pub id: String,
    pub pr_analysis_id: String,
    pub file_path: String,
    pub file_name: String,
    pub file_extension: Option<String>,
    pub detected_language: String,
    pub lines_total: i32,
    pub lines_analyzed: i32,
    pub lines_added: i32,
    pub lines_removed: i32,
    pub analysis_status: String,
    pub quality_score: i32,
    pub security_score: i32,
    pub complexity: f32,
    pub maintainability: f32,
    pub issues_count: i32,
    pub critical_issues_count: i32,
    pub recommendations: serde_json::Value,
    pub raw_diff: Option<String>,
    pub tools_run: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FileAnalysisRow> for FileAnalysis {
    fn from(r: FileAnalysisRow) -> Self {
        FileAnalysis {
            id: r.id,
            pr_analysis_id: r.pr_analysis_id,
            file_path: r.file_path,
            file_name: r.file_name,
            file_extension: r.file_extension,
            detected_language: r.detected_language,
            lines_total: r.lines_total as u32,
            lines_analyzed: r.lines_analyzed as u32,
            lines_added: r.lines_added as u32,
            lines_removed: r.lines_removed as u32,
            analysis_status: file_status_from_str(&r.analysis_status),
            quality_score: r.quality_score,
            security_score: r.security_score,
            complexity: r.complexity,
            maintainability: r.maintainability,
            issues_count: r.issues_count as u32,
            critical_issues_count: r.critical_issues_count as u32,
            recommendations: serde_json::from_value(r.recommendations).unwrap_or_default(),
            raw_diff: r.raw_diff,
            tools_run: serde_json::from_value(r.tools_run).unwrap_or_default(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct IssueRow {
    pub id: String,
    pub pr_analysis_id: String,
    pub file_analysis_id: Option<String>,
    pub issue_type: String,
    pub severity: String,
    pub file_path: Option<String>,
    pub line: Option<i32>,
    pub column: Option<i32>,
    pub title: String,
    pub description: String,
    pub code_snippet: Option<String>,
    pub suggestion: Option<String>,
    pub suggested_replacement: Option<String>,
    pub rule_id: Option<String>,
    pub tool_name: Option<String>,
    pub confidence: f32,
    pub tags: serde_json::Value,
    pub reference_urls: serde_json::Value,
}

impl From<IssueRow> for Issue {
    fn from(r: IssueRow) -> Self {
        Issue {
            id: r.id,
            pr_analysis_id: r.pr_analysis_id,
            file_analysis_id: r.file_analysis_id,
            issue_type: issue_type_from_str(&r.issue_type),
            severity: severity_from_str(&r.severity),
            file_path: r.file_path,
            line: r.line.map(|v| v as u32),
            column: r.column.map(|v| v as u32),
            title: r.title,
            description: r.description,
            code_snippet: r.code_snippet,
            suggestion: r.suggestion,
            suggested_replacement: r.suggested_replacement,
            rule_id: r.rule_id,
            tool_name: r.tool_name,
            confidence: r.confidence,
            tags: serde_json::from_value(r.tags).unwrap_or_default(),
            reference_urls: serde_json::from_value(r.reference_urls).unwrap_or_default(),
        }
    }
}
