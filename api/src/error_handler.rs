use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};
use analysis_core::AnalysisError;

/// Public application error type. Every route handler returns `AppResult<Response>`
/// and lets `?` fall through to here instead of hand-building an error envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A request-shape problem with field-level detail, e.g. an
    /// unparseable `repo_url` or a non-positive `pr_number`.
    #[error("validation error: {message}")]
    Validation {
        message: String,
        details: Vec<ApiErrorDetail>,
    },

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>, details: Vec<ApiErrorDetail>) -> Self {
        AppError::Validation {
            message: message.into(),
            details,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Analysis(AnalysisError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Analysis(AnalysisError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Analysis(AnalysisError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
            AppError::Analysis(AnalysisError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Analysis(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::NotFound => "NOT_FOUND",
            AppError::Analysis(AnalysisError::Validation(_)) => "VALIDATION_ERROR",
            AppError::Analysis(AnalysisError::NotFound(_)) => "NOT_FOUND",
            AppError::Analysis(AnalysisError::Unauthorized(_)) => "UNAUTHORIZED",
            AppError::Analysis(AnalysisError::RateLimited { .. }) => "RATE_LIMITED",
            AppError::Analysis(_) => "ANALYSIS_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();
        let details = match self {
            AppError::Validation { details, .. } => details,
            _ => Vec::new(),
        };
        let envelope = ApiResponse::<()>::error(code, message, details);
        envelope.into_response_with_status(status)
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
