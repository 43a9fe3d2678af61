use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// One per-field problem attached to an [`ApiError`], e.g. a malformed
/// `repo_url` or a non-positive `pr_number`. `path` is the submission
/// field name, `hint` a human-readable suggestion for fixing it.
#[derive(Debug, Serialize, Clone)]
pub struct ApiErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiErrorDetail {
    pub fn new(path: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            hint: Some(hint.into()),
        }
    }
}

/// The `error` half of [`ApiResponse`]: a stable machine-readable `code`
/// (`"VALIDATION_ERROR"`, `"NOT_FOUND"`, ...), a human-readable
/// `message`, and zero or more field-level `details`.
#[derive(Serialize)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ApiErrorDetail>,
}

/// The envelope every `submitAnalysis`/`getStatus`/`getResults` response
/// is wrapped in: `{success, data}` on the happy path, `{success,
/// error}` otherwise. `data` and `error` are mutually exclusive and
/// both omitted from the JSON when absent.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: &'static str, message: impl Into<String>, details: Vec<ApiErrorDetail>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
                details,
            }),
        }
    }

    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}
