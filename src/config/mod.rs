use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Root of the class tree (one directory per class).
    #[serde(default = "default_project_root")]
    pub project_root: String,

    /// Grading script, invoked through bash once per submission.
    /// Relative paths resolve against the script's working directory,
    /// which is the project root.
    #[serde(default = "default_grade_script")]
    pub grade_script: String,

    /// Directory holding one durable `.status` file per grading job.
    #[serde(default = "default_jobs_dir")]
    pub jobs_dir: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_project_root() -> String {
    ".".to_string()
}

fn default_grade_script() -> String {
    "./grade-quiz.sh".to_string()
}

fn default_jobs_dir() -> String {
    "grading-jobs".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
