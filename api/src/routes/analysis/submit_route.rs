use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::Response;
use code_host::RepoRef;
use tracing::{info, instrument};
use uuid::Uuid;

use analysis_core::{AnalysisError, Repository, Task, TaskPriority};

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};
use crate::error_handler::{AppError, AppResult};
use crate::routes::analysis::submit_request::SubmitAnalysisRequest;
use crate::routes::analysis::submit_response::SubmitAnalysisResponse;

fn parse_priority(raw: &str) -> TaskPriority {
    match raw.to_ascii_lowercase().as_str() {
        "low" => TaskPriority::Low,
        "high" => TaskPriority::High,
        "urgent" => TaskPriority::Urgent,
        _ => TaskPriority::Normal,
    }
}

/// `POST /analysis` — submitAnalysis(repoURL, prNumber, token?, priority, options?).
#[instrument(name = "submit_analysis", skip(state, body))]
pub async fn submit_analysis_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitAnalysisRequest>,
) -> AppResult<Response> {
    let repo_ref = RepoRef::parse(&body.repo_url).map_err(|e| {
        AppError::validation(
            e.to_string(),
            vec![ApiErrorDetail::new(
                "repo_url",
                "Expected https://github.com/<owner>/<repo> or git@github.com:<owner>/<repo>.git",
            )],
        )
    })?;

    if body.pr_number == 0 {
        return Err(AppError::validation(
            "pr_number must be positive",
            vec![ApiErrorDetail::new("pr_number", "PR number must be a positive integer.")],
        ));
    }

    let priority = parse_priority(&body.priority);
    let mut task = Task::new(
        Uuid::new_v4().to_string(),
        body.repo_url.clone(),
        repo_ref.owner.clone(),
        repo_ref.name.clone(),
        body.pr_number,
        priority,
    );
    if let Some(options) = body.options {
        task.config = options;
    }

    state.repo.insert_task(&task).await?;

    let ticket_id = state
        .queue
        .submit(&task.id, priority)
        .await
        .map_err(AnalysisError::from)?;

    task.queue_ticket_id = Some(ticket_id);
    state.repo.update_task(&task).await?;

    info!(task_id = %task.id, repo = %body.repo_url, pr = body.pr_number, "analysis submitted");

    Ok(
        ApiResponse::success(SubmitAnalysisResponse { task_id: task.id })
            .into_response_with_status(StatusCode::ACCEPTED),
    )
}
