use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app_state::AppState;
use crate::models::job::JobSnapshot;
use crate::routes::{error_response, ApiError};

/// GET /api/grading-status/{job_id} — poll a grading job.
///
/// The registry consults its in-memory map first and falls back to the
/// durable status file, so jobs from a previous server lifetime still
/// answer.
pub async fn grading_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobSnapshot>, ApiError> {
    match state.registry.lookup(&job_id).await {
        Some(snapshot) => Ok(Json(snapshot)),
        None => Err(error_response(StatusCode::NOT_FOUND, "Job not found")),
    }
}
