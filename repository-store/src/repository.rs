//! Postgres-backed implementation of `analysis_core::Repository`.

use sqlx::PgPool;

use analysis_core::{AnalysisError, FileAnalysis, Issue, PrAnalysis, Repository, Task};

use crate::error::map_sqlx_error;
use crate::rows::{
    file_status_to_str, issue_type_to_str, pr_status_to_str, priority_to_str, severity_to_str,
    task_status_to_str, FileAnalysisRow, IssueRow, PrAnalysisRow, TaskRow,
};

pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_task(&self, task: &Task) -> Result<(), AnalysisError> {
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, repo_url, repo_owner, repo_name, pr_number, priority, status, progress,
                queue_ticket_id, created_at, updated_at, started_at, completed_at,
                retry_count, max_retries, config, error_message, error_details
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(&task.id)
        .bind(&task.repo_url)
        .bind(&task.repo_owner)
        .bind(&task.repo_name)
        .bind(task.pr_number as i64)
        .bind(priority_to_str(task.priority))
        .bind(task_status_to_str(task.status))
        .bind(task.progress as i16)
        .bind(&task.queue_ticket_id)
        .bind(task.created_at)
        .bind(task.updated_at)
        .bind(task.started_at)
        .bind(task.completed_at)
        .bind(task.retry_count as i32)
        .bind(task.max_retries as i32)
        .bind(&task.config)
        .bind(&task.error_message)
        .bind(&task.error_details)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}

impl Repository for PgRepository {
    async fn get_task(&self, task_id: &str) -> Result<Option<Task>, AnalysisError> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Task::from))
    }

    async fn update_task(&self, task: &Task) -> Result<(), AnalysisError> {
        sqlx::query(
            r#"
            UPDATE tasks SET
                status = $2, progress = $3, queue_ticket_id = $4, updated_at = $5,
                started_at = $6, completed_at = $7, retry_count = $8,
                error_message = $9, error_details = $10
            WHERE id = $1
            "#,
        )
        .bind(&task.id)
        .bind(task_status_to_str(task.status))
        .bind(task.progress as i16)
        .bind(&task.queue_ticket_id)
        .bind(task.updated_at)
        .bind(task.started_at)
        .bind(task.completed_at)
        .bind(task.retry_count as i32)
        .bind(&task.error_message)
        .bind(&task.error_details)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get_pr_analysis_by_task_id(&self, task_id: &str) -> Result<Option<PrAnalysis>, AnalysisError> {
        let row: Option<PrAnalysisRow> = sqlx::query_as("SELECT * FROM pr_analyses WHERE task_id = $1")
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(PrAnalysis::from))
    }

    async fn insert_pr_analysis(&self, pr: &PrAnalysis) -> Result<(), AnalysisError> {
        sqlx::query(
            r#"
            INSERT INTO pr_analyses (
                id, task_id, pr_url, base_branch, head_branch, base_sha, head_sha, status,
                analysis_started_at, analysis_completed_at, files_analyzed, lines_analyzed,
                issues_found, severity_critical, severity_high, severity_medium, severity_low,
                severity_info, score_quality, score_maintainability, score_complexity, summary,
                recommendations, error_message, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
                $19, $20, $21, $22, $23, $24, $25, $26
            )
            "#,
        )
        .bind(&pr.id)
        .bind(&pr.task_id)
        .bind(&pr.pr_url)
        .bind(&pr.base_branch)
        .bind(&pr.head_branch)
        .bind(&pr.base_sha)
        .bind(&pr.head_sha)
        .bind(pr_status_to_str(pr.status))
        .bind(pr.analysis_started_at)
        .bind(pr.analysis_completed_at)
        .bind(pr.files_analyzed as i32)
        .bind(pr.lines_analyzed as i32)
        .bind(pr.issues_found as i32)
        .bind(pr.severity_counts.critical as i32)
        .bind(pr.severity_counts.high as i32)
        .bind(pr.severity_counts.medium as i32)
        .bind(pr.severity_counts.low as i32)
        .bind(pr.severity_counts.info as i32)
        .bind(pr.scores.map(|s| s.quality))
        .bind(pr.scores.map(|s| s.maintainability))
        .bind(pr.scores.map(|s| s.complexity))
        .bind(&pr.summary)
        .bind(serde_json::to_value(&pr.recommendations).unwrap_or_default())
        .bind(&pr.error_message)
        .bind(pr.created_at)
        .bind(pr.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn update_pr_analysis(&self, pr: &PrAnalysis) -> Result<(), AnalysisError> {
        sqlx::query(
            r#"
            UPDATE pr_analyses SET
                base_branch = $2, head_branch = $3, base_sha = $4, head_sha = $5, status = $6,
                analysis_started_at = $7, analysis_completed_at = $8, files_analyzed = $9,
                lines_analyzed = $10, issues_found = $11, severity_critical = $12,
                severity_high = $13, severity_medium = $14, severity_low = $15,
                severity_info = $16, score_quality = $17, score_maintainability = $18,
                score_complexity = $19, summary = $20, recommendations = $21,
                error_message = $22, updated_at = $23
            WHERE id = $1
            "#,
        )
        .bind(&pr.id)
        .bind(&pr.base_branch)
        .bind(&pr.head_branch)
        .bind(&pr.base_sha)
        .bind(&pr.head_sha)
        .bind(pr_status_to_str(pr.status))
        .bind(pr.analysis_started_at)
        .bind(pr.analysis_completed_at)
        .bind(pr.files_analyzed as i32)
        .bind(pr.lines_analyzed as i32)
        .bind(pr.issues_found as i32)
        .bind(pr.severity_counts.critical as i32)
        .bind(pr.severity_counts.high as i32)
        .bind(pr.severity_counts.medium as i32)
        .bind(pr.severity_counts.low as i32)
        .bind(pr.severity_counts.info as i32)
        .bind(pr.scores.map(|s| s.quality))
        .bind(pr.scores.map(|s| s.maintainability))
        .bind(pr.scores.map(|s| s.complexity))
        .bind(&pr.summary)
        .bind(serde_json::to_value(&pr.recommendations).unwrap_or_default())
        .bind(&pr.error_message)
        .bind(pr.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn insert_file_analysis(&self, file_analysis: &FileAnalysis, issues: &[Issue]) -> Result<(), AnalysisError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            INSERT INTO file_analyses (
                id, pr_analysis_id, file_path, file_name, file_extension, detected_language,
                lines_total, lines_analyzed, lines_added, lines_removed, analysis_status,
                quality_score, security_score, complexity, maintainability, issues_count,
                critical_issues_count, recommendations, raw_diff, tools_run, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
            ON CONFLICT (pr_analysis_id, file_path) DO UPDATE SET
                analysis_status = EXCLUDED.analysis_status,
                quality_score = EXCLUDED.quality_score,
                security_score = EXCLUDED.security_score,
                complexity = EXCLUDED.complexity,
                maintainability = EXCLUDED.maintainability,
                issues_count = EXCLUDED.issues_count,
                critical_issues_count = EXCLUDED.critical_issues_count,
                recommendations = EXCLUDED.recommendations,
                raw_diff = EXCLUDED.raw_diff,
                tools_run = EXCLUDED.tools_run,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&file_analysis.id)
        .bind(&file_analysis.pr_analysis_id)
        .bind(&file_analysis.file_path)
        .bind(&file_analysis.file_name)
        .bind(&file_analysis.file_extension)
        .bind(&file_analysis.detected_language)
        .bind(file_analysis.lines_total as i32)
        .bind(file_analysis.lines_analyzed as i32)
        .bind(file_analysis.lines_added as i32)
        .bind(file_analysis.lines_removed as i32)
        .bind(file_status_to_str(file_analysis.analysis_status))
        .bind(file_analysis.quality_score)
        .bind(file_analysis.security_score)
        .bind(file_analysis.complexity)
        .bind(file_analysis.maintainability)
        .bind(file_analysis.issues_count as i32)
        .bind(file_analysis.critical_issues_count as i32)
        .bind(serde_json::to_value(&file_analysis.recommendations).unwrap_or_default())
        .bind(&file_analysis.raw_diff)
        .bind(serde_json::to_value(&file_analysis.tools_run).unwrap_or_default())
        .bind(file_analysis.created_at)
        .bind(file_analysis.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        for issue in issues {
            sqlx::query(
                r#"
                INSERT INTO issues (
                    id, pr_analysis_id, file_analysis_id, issue_type, severity, file_path, line,
                    "column", title, description, code_snippet, suggestion,
                    suggested_replacement, rule_id, tool_name, confidence, tags, reference_urls
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
                ON CONFLICT (pr_analysis_id, issue_type, COALESCE(file_path, ''), COALESCE(line, -1), COALESCE(rule_id, ''), title)
                DO NOTHING
                "#,
            )
            .bind(&issue.id)
            .bind(&issue.pr_analysis_id)
            .bind(&issue.file_analysis_id)
            .bind(issue_type_to_str(issue.issue_type))
            .bind(severity_to_str(issue.severity))
            .bind(&issue.file_path)
            .bind(issue.line.map(|v| v as i32))
            .bind(issue.column.map(|v| v as i32))
            .bind(&issue.title)
            .bind(&issue.description)
            .bind(&issue.code_snippet)
            .bind(&issue.suggestion)
            .bind(&issue.suggested_replacement)
            .bind(&issue.rule_id)
            .bind(&issue.tool_name)
            .bind(issue.confidence)
            .bind(serde_json::to_value(&issue.tags).unwrap_or_default())
            .bind(serde_json::to_value(&issue.reference_urls).unwrap_or_default())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}

/// Reads back the Issue rows attached to a PRAnalysis, used by the `api`
/// crate's results endpoint.
pub async fn list_issues_for_pr(pool: &PgPool, pr_analysis_id: &str) -> Result<Vec<Issue>, AnalysisError> {
    let rows: Vec<IssueRow> = sqlx::query_as("SELECT * FROM issues WHERE pr_analysis_id = $1")
        .bind(pr_analysis_id)
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(rows.into_iter().map(Issue::from).collect())
}

/// Reads back the FileAnalysis rows attached to a PRAnalysis.
pub async fn list_files_for_pr(pool: &PgPool, pr_analysis_id: &str) -> Result<Vec<FileAnalysis>, AnalysisError> {
    let rows: Vec<FileAnalysisRow> = sqlx::query_as("SELECT * FROM file_analyses WHERE pr_analysis_id = $1")
        .bind(pr_analysis_id)
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(rows.into_iter().map(FileAnalysis::from).collect())
}
