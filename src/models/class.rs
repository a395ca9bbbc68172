use chrono::{DateTime, Utc};
use serde::Serialize;

/// One class directory under the project root.
#[derive(Debug, Clone, Serialize)]
pub struct ClassSummary {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ClassListResponse {
    pub classes: Vec<ClassSummary>,
}

/// A quiz document in a class's `Quiz` directory.
#[derive(Debug, Clone, Serialize)]
pub struct QuizInfo {
    /// Display name: filename stem with underscores as spaces.
    pub name: String,
    pub filename: String,
    pub url: String,
}

/// A study guide in a class's `Guide` directory.
#[derive(Debug, Clone, Serialize)]
pub struct GuideInfo {
    pub name: String,
    pub filename: String,
    pub url: String,
}

/// A saved answer file in a class's `Answers` directory.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerFileInfo {
    pub name: String,
    pub filename: String,
    pub url: String,
    pub date: DateTime<Utc>,
    pub size: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfoResponse {
    pub class_name: String,
    pub quizzes: Vec<QuizInfo>,
    pub guides: Vec<GuideInfo>,
    pub saved_answers: Vec<AnswerFileInfo>,
}
