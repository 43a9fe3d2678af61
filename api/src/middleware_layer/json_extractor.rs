use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

/// Submission-body field names `guess_rejected_field` checks for, in the
/// order a serde rejection message is most likely to name them.
const SUBMISSION_FIELDS: [&str; 5] = ["repo_url", "pr_number", "priority", "options", "token"];

async fn drain_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

/// axum's JSON rejection message is plain text (e.g. "missing field
/// `pr_number` at line 1 column 42"); this just checks which of our own
/// field names shows up in it so the error envelope can point at one.
fn guess_rejected_field(rejection_msg: &str) -> Option<String> {
    SUBMISSION_FIELDS
        .iter()
        .find(|field| rejection_msg.contains(*field))
        .map(|field| field.to_string())
}

/// Stamps `X-Request-Id` on the response if the caller didn't send one,
/// and returns the id either way. The id only ever lives in the header —
/// callers that want it echoed in the body should read the header.
fn stamp_request_id(parts: &mut axum::http::response::Parts) -> String {
    if let Some(existing) = parts.headers.get("X-Request-Id") {
        if let Ok(v) = existing.to_str() {
            if !v.trim().is_empty() {
                return v.to_string();
            }
        }
    }
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    let id = format!("req-{nanos}");
    parts
        .headers
        .insert("X-Request-Id", HeaderValue::from_str(&id).unwrap());
    id
}

/// Rewrites a 400/422 produced by axum's `Json` extractor (a malformed or
/// schema-mismatched submission body) into the standard `ApiResponse`
/// error envelope, so clients see the same error shape whether the
/// rejection happened in an extractor or inside a route handler.
pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();

    if !(status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY) {
        return res;
    }

    let (mut parts, bytes) = drain_body(res).await;
    let rejection_msg = String::from_utf8_lossy(&bytes);
    let _request_id = stamp_request_id(&mut parts);

    let detail = ApiErrorDetail {
        path: guess_rejected_field(&rejection_msg),
        hint: if rejection_msg.contains("expected a sequence") {
            Some("Expected an array for this field (e.g. [\"item1\", \"item2\"]).".into())
        } else if rejection_msg.contains("expected a map") || rejection_msg.contains("expected struct") {
            Some("Expected a JSON object here (e.g. { \"field\": \"value\" }).".into())
        } else {
            None
        },
    };

    let envelope = ApiResponse::<()>::error(
        if status == StatusCode::BAD_REQUEST {
            "BAD_REQUEST"
        } else {
            "UNPROCESSABLE_ENTITY"
        },
        rejection_msg.trim(),
        vec![detail],
    );

    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts.headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Response::from_parts(parts, body.into())
}
