use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a grading job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Complete,
    Error,
}

impl JobStatus {
    /// Parse the bare-text form used by early status files, which stored the
    /// literal status string instead of a JSON record.
    pub fn from_bare(content: &str) -> Option<Self> {
        match content.trim() {
            "processing" => Some(Self::Processing),
            "complete" => Some(Self::Complete),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// One asynchronous grading run triggered by a single answer submission.
///
/// Created with `status = processing` at submission time and mutated exactly
/// once, when the grading process reaches a terminal state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingJob {
    pub job_id: String,
    pub status: JobStatus,
    pub class_name: String,
    pub student_name: String,
    pub quiz_name: String,
    pub answers_file: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Set iff `status == Complete`.
    pub results_url: Option<String>,
    /// Set iff `status == Error`.
    pub error: Option<String>,
}

impl GradingJob {
    pub fn new(
        job_id: impl Into<String>,
        class_name: impl Into<String>,
        student_name: impl Into<String>,
        quiz_name: impl Into<String>,
        answers_file: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Processing,
            class_name: class_name.into(),
            student_name: student_name.into(),
            quiz_name: quiz_name.into(),
            answers_file: answers_file.into(),
            start_time: Utc::now(),
            end_time: None,
            results_url: None,
            error: None,
        }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            status: self.status,
            results_url: self.results_url.clone(),
            error: self.error.clone(),
        }
    }
}

/// Durable mirror payload, one JSON file per job id under the jobs
/// directory. The `resultsUrl`/`error` keys are omitted unless set so the
/// files stay byte-compatible with earlier status files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusRecord {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatusRecord {
    pub fn processing() -> Self {
        Self {
            status: JobStatus::Processing,
            results_url: None,
            error: None,
        }
    }

    pub fn complete(results_url: String) -> Self {
        Self {
            status: JobStatus::Complete,
            results_url: Some(results_url),
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            status: JobStatus::Error,
            results_url: None,
            error: Some(error),
        }
    }

    pub fn into_snapshot(self) -> JobSnapshot {
        JobSnapshot {
            status: self.status,
            results_url: self.results_url,
            error: self.error,
        }
    }
}

/// Response for querying job status; unset fields serialize as explicit
/// nulls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub results_url: Option<String>,
    pub error: Option<String>,
}
