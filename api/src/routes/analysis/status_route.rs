use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use tracing::instrument;

use analysis_core::Repository;

use crate::core::app_state::AppState;
use crate::core::http::response_envelope::ApiResponse;
use crate::error_handler::{AppError, AppResult};
use crate::routes::analysis::status_response::StatusResponse;

/// `GET /analysis/:task_id/status` — getStatus(task_id).
#[instrument(name = "get_analysis_status", skip(state))]
pub async fn get_status_route(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> AppResult<Response> {
    let task = state.repo.get_task(&task_id).await?.ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(StatusResponse {
        task_id: task.id,
        status: format!("{:?}", task.status).to_lowercase(),
        progress: task.progress,
        created_at: task.created_at,
        updated_at: task.updated_at,
        error: task.error_message,
    })
    .into_response_with_status(StatusCode::OK))
}
