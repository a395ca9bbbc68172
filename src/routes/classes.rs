use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app_state::AppState;
use crate::models::class::{ClassInfoResponse, ClassListResponse};
use crate::routes::{error_response, ApiError};
use crate::services::repository::RepoError;

/// GET /api/classes — list available classes.
pub async fn list_classes(
    State(state): State<AppState>,
) -> Result<Json<ClassListResponse>, ApiError> {
    match state.repo.list_classes().await {
        Ok(classes) => Ok(Json(ClassListResponse { classes })),
        Err(e) => {
            tracing::error!(error = %e, "failed to read classes");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read classes",
            ))
        }
    }
}

/// GET /api/class/{class_name} — quizzes, guides, and saved answers.
pub async fn class_info(
    State(state): State<AppState>,
    Path(class_name): Path<String>,
) -> Result<Json<ClassInfoResponse>, ApiError> {
    match state.repo.class_info(&class_name).await {
        Ok(info) => Ok(Json(info)),
        Err(RepoError::NotFound) | Err(RepoError::InvalidPath(_)) => {
            Err(error_response(StatusCode::NOT_FOUND, "Class not found"))
        }
        Err(e) => {
            tracing::error!(class = %class_name, error = %e, "failed to get class information");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get class information",
            ))
        }
    }
}
