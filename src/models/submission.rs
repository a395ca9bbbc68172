use garde::Validate;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/answers/{class_name}`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswersRequest {
    /// Student name, required.
    #[garde(required, length(min = 1))]
    pub name: Option<String>,

    /// Display date chosen by the quiz page; informational only.
    #[garde(skip)]
    pub date: Option<String>,

    /// Client-supplied timestamp used in the answer filename; generated
    /// server-side when absent.
    #[garde(skip)]
    pub timestamp: Option<String>,

    /// Raw answer text, persisted verbatim.
    #[garde(required, length(min = 1))]
    pub answers: Option<String>,

    #[garde(skip)]
    pub quiz_name: Option<String>,
}

/// Response after saving answers and starting a grading job.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswersResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
    pub path: String,
    pub job_id: String,
    pub status_url: String,
}
