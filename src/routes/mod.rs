pub mod answers;
pub mod classes;
pub mod content;
pub mod grading;
pub mod health;
pub mod metrics;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// JSON error body shared by the API routes.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorBody>);

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}
