use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::app_state::AppState;
use crate::models::submission::{SubmitAnswersRequest, SubmitAnswersResponse};
use crate::routes::{error_response, ApiError};
use crate::services::submissions::SubmissionError;

/// POST /api/answers/{class_name} — save answers and start grading.
pub async fn submit_answers(
    State(state): State<AppState>,
    Path(class_name): Path<String>,
    Json(request): Json<SubmitAnswersRequest>,
) -> Result<Json<SubmitAnswersResponse>, ApiError> {
    match state.submissions.submit(&class_name, request).await {
        Ok(response) => Ok(Json(response)),
        Err(e @ SubmissionError::Validation(_)) | Err(e @ SubmissionError::InvalidClass(_)) => {
            Err(error_response(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(SubmissionError::Storage(e)) => {
            tracing::error!(class = %class_name, error = %e, "failed to save answers");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save answers",
            ))
        }
    }
}

/// GET /api/answers/{class_name}/{filename} — view a saved answer file.
pub async fn get_answer_file(
    State(state): State<AppState>,
    Path((class_name, filename)): Path<(String, String)>,
) -> Response {
    match state.repo.read_answer(&class_name, &filename).await {
        Ok(content) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            content,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Answer file not found").into_response(),
    }
}
