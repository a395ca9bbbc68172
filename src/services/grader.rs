use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::services::registry::JobRegistry;

/// One grading run, carrying the sanitized identifiers the results artifact
/// name is derived from.
#[derive(Debug, Clone)]
pub struct GradingTask {
    pub job_id: String,
    pub class_name: String,
    pub answers_path: PathBuf,
    pub quiz_name: String,
    pub student_name: String,
    pub timestamp: String,
}

impl GradingTask {
    /// Deterministic artifact name the grading script is expected to write
    /// into the class's `Archive` directory.
    pub fn results_filename(&self) -> String {
        format!(
            "{}_{}_{}_results.html",
            self.quiz_name, self.student_name, self.timestamp
        )
    }
}

/// Runs the external grading script, exactly one process per job, and
/// reports the outcome to the job registry. No retry, no timeout, no
/// cancellation: the run ends when the subprocess exits or fails to start.
pub struct GradingRunner {
    registry: Arc<JobRegistry>,
    project_root: PathBuf,
    grade_script: PathBuf,
}

impl GradingRunner {
    pub fn new(
        registry: Arc<JobRegistry>,
        project_root: impl Into<PathBuf>,
        grade_script: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            project_root: project_root.into(),
            grade_script: grade_script.into(),
        }
    }

    /// Run the grading script for one job and publish the outcome.
    /// Resolves only once the subprocess has exited.
    pub async fn run(&self, task: GradingTask) {
        tracing::info!(
            job_id = %task.job_id,
            class = %task.class_name,
            quiz = %task.quiz_name,
            "starting grading"
        );
        let started = Instant::now();

        let mut cmd = Command::new("bash");
        cmd.arg(&self.grade_script)
            .arg(&task.class_name)
            .arg(&task.answers_path)
            .arg(&task.job_id)
            .current_dir(&self.project_root)
            .env("PROJECT_ROOT", &self.project_root)
            .env("QUIZ_NAME", &task.quiz_name)
            .env("STUDENT_NAME", &task.student_name)
            .env("TIMESTAMP", &task.timestamp)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(job_id = %task.job_id, error = %e, "failed to start grading process");
                self.registry
                    .fail(&task.job_id, format!("Failed to start grading process: {e}"))
                    .await;
                metrics::counter!("grading_jobs_failed").increment(1);
                return;
            }
        };

        // Drain both pipes as they fill so a chatty script cannot deadlock
        // against a full pipe buffer.
        let stdout = child
            .stdout
            .take()
            .map(|out| drain_lines(task.job_id.clone(), "stdout", out));
        let stderr = child
            .stderr
            .take()
            .map(|err| drain_lines(task.job_id.clone(), "stderr", err));

        let status = child.wait().await;

        let stderr_text = match stderr {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };
        if let Some(handle) = stdout {
            let _ = handle.await;
        }

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(job_id = %task.job_id, error = %e, "failed to wait for grading process");
                self.registry
                    .fail(&task.job_id, format!("Failed to wait for grading process: {e}"))
                    .await;
                metrics::counter!("grading_jobs_failed").increment(1);
                return;
            }
        };

        let elapsed = started.elapsed();
        metrics::histogram!("grading_duration_seconds").record(elapsed.as_secs_f64());
        tracing::info!(
            job_id = %task.job_id,
            exit_code = ?status.code(),
            elapsed_ms = elapsed.as_millis() as u64,
            "grading script exited"
        );

        if !status.success() {
            let trimmed = stderr_text.trim();
            let message = if trimmed.is_empty() {
                "Grading failed".to_string()
            } else {
                trimmed.to_string()
            };
            self.registry.fail(&task.job_id, message).await;
            metrics::counter!("grading_jobs_failed").increment(1);
            return;
        }

        // The exit code alone is not trusted: the artifact the client is
        // about to be pointed at must actually exist.
        let results_file = task.results_filename();
        let artifact = self
            .project_root
            .join(&task.class_name)
            .join("Archive")
            .join(&results_file);

        if tokio::fs::try_exists(&artifact).await.unwrap_or(false) {
            let results_url = format!("/results/{}/{}", task.class_name, results_file);
            tracing::info!(job_id = %task.job_id, results_url = %results_url, "grading complete");
            self.registry.complete(&task.job_id, results_url).await;
            metrics::counter!("grading_jobs_completed").increment(1);
        } else {
            tracing::error!(
                job_id = %task.job_id,
                artifact = %artifact.display(),
                "grading exited 0 but produced no results file"
            );
            self.registry
                .fail(
                    &task.job_id,
                    format!("Grading finished but no results file was produced: {results_file}"),
                )
                .await;
            metrics::counter!("grading_jobs_failed").increment(1);
        }
    }
}

/// Stream one pipe line-by-line: log each line under the job id and return
/// the collected text for diagnostics.
fn drain_lines<R>(job_id: String, stream: &'static str, reader: R) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        let mut collected = String::new();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!(job_id = %job_id, stream, line = %line, "grading output");
            collected.push_str(&line);
            collected.push('\n');
        }
        collected
    })
}
