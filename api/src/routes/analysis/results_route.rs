use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use tracing::instrument;

use analysis_core::{PrAnalysisStatus, Repository};
use repository_store::{list_files_for_pr, list_issues_for_pr};

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::{AppError, AppResult};
use crate::routes::analysis::results_response::{
    build_file_results, AnalysisSummary, PrMetadata, ResultsMetadata, ResultsResponse,
};

/// `GET /analysis/:task_id/results` — getResults(task_id).
#[instrument(name = "get_analysis_results", skip(state))]
pub async fn get_results_route(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> AppResult<Response> {
    let task = state.repo.get_task(&task_id).await?.ok_or(AppError::NotFound)?;

    let pr = match state.repo.get_pr_analysis_by_task_id(&task_id).await? {
        Some(pr) if pr.status == PrAnalysisStatus::Completed => pr,
        _ => {
            return Ok(ApiResponse::<()>::error(
                "NOT_COMPLETED",
                format!("task {task_id} has not completed (status: {:?})", task.status),
                Vec::new(),
            )
            .into_response_with_status(StatusCode::CONFLICT))
        }
    };

    let files = list_files_for_pr(&state.pool, &pr.id).await?;
    let issues = list_issues_for_pr(&state.pool, &pr.id).await?;

    let response = ResultsResponse {
        task_id: task.id,
        status: "completed".to_string(),
        pr_metadata: PrMetadata {
            pr_url: pr.pr_url.clone(),
            base_branch: pr.base_branch.clone(),
            head_branch: pr.head_branch.clone(),
            base_sha: pr.base_sha.clone(),
            head_sha: pr.head_sha.clone(),
        },
        summary: AnalysisSummary {
            scores: pr.scores,
            summary: pr.summary.clone(),
            recommendations: pr.recommendations.clone(),
            issues_found: pr.issues_found,
            severity_counts: pr.severity_counts,
        },
        metadata: ResultsMetadata {
            files_analyzed: pr.files_analyzed,
            lines_analyzed: pr.lines_analyzed,
        },
        files: build_file_results(files, issues),
    };

    Ok(ApiResponse::success(response).into_response_with_status(StatusCode::OK))
}
