use std::path::Path as FsPath;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::app_state::AppState;
use crate::services::repository::RepoError;

/// GET /quiz/{class_name}/{quiz_file} — serve a quiz document.
pub async fn serve_quiz(
    State(state): State<AppState>,
    Path((class_name, quiz_file)): Path<(String, String)>,
) -> Response {
    let path = match state.repo.quiz_path(&class_name, &quiz_file).await {
        Ok(path) => path,
        Err(RepoError::NotFound) | Err(RepoError::InvalidPath(_)) => {
            return (StatusCode::NOT_FOUND, "Quiz not found").into_response();
        }
        Err(e) => {
            tracing::error!(class = %class_name, file = %quiz_file, error = %e, "failed to serve quiz");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load quiz").into_response();
        }
    };
    serve_file(&path, "text/html; charset=utf-8", "Failed to load quiz").await
}

/// GET /guide/{class_name}/{filename} — serve a study guide with a content
/// type mapped from the file extension.
pub async fn serve_guide(
    State(state): State<AppState>,
    Path((class_name, filename)): Path<(String, String)>,
) -> Response {
    let path = match state.repo.guide_path(&class_name, &filename).await {
        Ok(path) => path,
        Err(RepoError::NotFound) | Err(RepoError::InvalidPath(_)) => {
            return (StatusCode::NOT_FOUND, "Guide not found").into_response();
        }
        Err(e) => {
            tracing::error!(class = %class_name, file = %filename, error = %e, "failed to serve guide");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load guide").into_response();
        }
    };
    serve_file(&path, guide_content_type(&filename), "Failed to load guide").await
}

/// GET /results/{class_name}/{filename} — serve a graded results artifact
/// from the class archive.
pub async fn serve_results(
    State(state): State<AppState>,
    Path((class_name, filename)): Path<(String, String)>,
) -> Response {
    let path = match state.repo.results_path(&class_name, &filename).await {
        Ok(path) => path,
        Err(RepoError::NotFound) | Err(RepoError::InvalidPath(_)) => {
            return (StatusCode::NOT_FOUND, "Results not found").into_response();
        }
        Err(e) => {
            tracing::error!(class = %class_name, file = %filename, error = %e, "failed to serve results");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load results").into_response();
        }
    };
    serve_file(&path, "text/html; charset=utf-8", "Failed to load results").await
}

async fn serve_file(path: &FsPath, content_type: &'static str, error_message: &'static str) -> Response {
    match tokio::fs::read(path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to read file");
            (StatusCode::INTERNAL_SERVER_ERROR, error_message).into_response()
        }
    }
}

fn guide_content_type(filename: &str) -> &'static str {
    let ext = FsPath::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("txt") => "text/plain; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guide_content_types_match_extension() {
        assert_eq!(guide_content_type("mitosis.pdf"), "application/pdf");
        assert_eq!(guide_content_type("photo.JPG"), "image/jpeg");
        assert_eq!(guide_content_type("notes.txt"), "text/plain; charset=utf-8");
        assert_eq!(guide_content_type("mystery.xyz"), "application/octet-stream");
        assert_eq!(guide_content_type("no_extension"), "application/octet-stream");
    }
}
