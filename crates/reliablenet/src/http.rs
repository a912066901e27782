use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub(crate) fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    let message: String = message.into();
    (status, Json(json!({ "error": message }))).into_response()
}

/// Generic 500; the underlying error only goes to the logs.
pub(crate) fn internal_error(action: &str, err: &dyn std::error::Error) -> Response {
    tracing::error!(error = %err, "failed to {action}");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to {action}"),
    )
}

/// Malformed or incomplete JSON bodies answer 400 with the usual `{ "error": ... }` shape.
pub(crate) fn rejected_body(rejection: JsonRejection) -> Response {
    tracing::debug!(status = %rejection.status(), "request body rejected");
    json_error(StatusCode::BAD_REQUEST, rejection.body_text())
}
