use std::sync::Arc;

use chrono::Utc;
use garde::Validate;

use crate::models::job::GradingJob;
use crate::models::submission::{SubmitAnswersRequest, SubmitAnswersResponse};
use crate::services::grader::{GradingRunner, GradingTask};
use crate::services::registry::JobRegistry;
use crate::services::repository::{ClassRepository, PathError};

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// Missing/empty required fields; nothing has been written.
    #[error("Missing required fields: name and answers")]
    Validation(#[source] garde::Report),

    #[error("Invalid class name")]
    InvalidClass(#[from] PathError),

    #[error("Failed to save answers")]
    Storage(#[from] std::io::Error),
}

/// Validates a submission, persists the answer file, registers a grading
/// job, and fires off the grading process. Returns as soon as the grading
/// task is spawned; the outcome is observed via the status endpoint.
pub struct SubmissionService {
    repo: Arc<ClassRepository>,
    registry: Arc<JobRegistry>,
    grader: Arc<GradingRunner>,
}

impl SubmissionService {
    pub fn new(
        repo: Arc<ClassRepository>,
        registry: Arc<JobRegistry>,
        grader: Arc<GradingRunner>,
    ) -> Self {
        Self {
            repo,
            registry,
            grader,
        }
    }

    pub async fn submit(
        &self,
        class_name: &str,
        request: SubmitAnswersRequest,
    ) -> Result<SubmitAnswersResponse, SubmissionError> {
        request.validate().map_err(SubmissionError::Validation)?;
        // Both required by validation above.
        let name = request.name.as_deref().unwrap_or_default();
        let answers = request.answers.as_deref().unwrap_or_default();

        let quiz_name = sanitize_quiz_name(request.quiz_name.as_deref());
        let student_name = sanitize_student_name(name);
        let timestamp = request
            .timestamp
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(String::from)
            .unwrap_or_else(generate_timestamp);

        let filename = format!("{quiz_name}_{student_name}_{timestamp}.txt");
        let answers_dir = self.repo.answers_dir(class_name)?;
        tokio::fs::create_dir_all(&answers_dir).await?;
        let answers_path = answers_dir.join(&filename);
        tokio::fs::write(&answers_path, answers).await?;

        tracing::info!(class = %class_name, file = %filename, "saved answers");

        let job_id = uuid::Uuid::new_v4().simple().to_string();
        let job = GradingJob::new(&job_id, class_name, name, &quiz_name, &filename);
        // The durable record is written before the grading task exists, so a
        // job's transitions are strictly ordered create -> terminal.
        self.registry.create(job).await;
        metrics::counter!("grading_jobs_total").increment(1);

        let task = GradingTask {
            job_id: job_id.clone(),
            class_name: class_name.to_string(),
            answers_path,
            quiz_name,
            student_name,
            timestamp,
        };
        let grader = Arc::clone(&self.grader);
        tokio::spawn(async move {
            grader.run(task).await;
        });

        Ok(SubmitAnswersResponse {
            success: true,
            message: "Answers saved successfully. Grading started.".to_string(),
            path: format!("/api/answers/{class_name}/{filename}"),
            filename,
            status_url: format!("/api/grading-status/{job_id}"),
            job_id,
        })
    }
}

/// Quiz name for filenames: non-alphanumerics become underscores, absent or
/// empty falls back to "Quiz".
fn sanitize_quiz_name(raw: Option<&str>) -> String {
    raw.filter(|s| !s.is_empty())
        .unwrap_or("Quiz")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Student name for filenames: whitespace becomes underscores, everything
/// else outside `[A-Za-z0-9_]` is stripped.
fn sanitize_student_name(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

fn generate_timestamp() -> String {
    Utc::now().format("%Y-%m-%d_%H-%M-%S-%3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_names_are_reduced_to_identifier_chars() {
        assert_eq!(sanitize_quiz_name(Some("Pop Quiz #1")), "Pop_Quiz__1");
        assert_eq!(sanitize_quiz_name(Some("Cell-Division")), "Cell_Division");
        assert_eq!(sanitize_quiz_name(None), "Quiz");
        assert_eq!(sanitize_quiz_name(Some("")), "Quiz");
    }

    #[test]
    fn student_names_keep_underscores_and_drop_symbols() {
        assert_eq!(sanitize_student_name("Ada Lovelace"), "Ada_Lovelace");
        assert_eq!(sanitize_student_name("José O'Neil"), "Jos_ONeil");
        assert_eq!(sanitize_student_name("  spaced  "), "__spaced__");
    }

    #[test]
    fn generated_timestamps_round_trip_through_chrono() {
        let timestamp = generate_timestamp();
        assert!(timestamp.ends_with('Z'));
        chrono::NaiveDateTime::parse_from_str(&timestamp, "%Y-%m-%d_%H-%M-%S-%3fZ")
            .expect("timestamp should parse back with its own format");
    }
}
