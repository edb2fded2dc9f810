//! HTTP request handlers.

mod chat;
mod health;
mod sessions;

pub use chat::chat;
pub use health::{livez, readyz, version};
pub use sessions::{get_messages, get_session, list_sessions};

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// JSON error body used by every non-stream error response.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
}

/// Build an error response with the `{"error": ...}` body.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}
