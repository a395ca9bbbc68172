use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::Utc;

use crate::models::job::{GradingJob, JobSnapshot, JobStatus, JobStatusRecord};

/// In-memory authoritative store of grading-job state, mirrored to one
/// durable `.status` file per job for crash/restart resilience.
///
/// The map is only the fast path: after a server restart, `lookup` falls
/// back to the durable record so polling clients still get a best-effort
/// answer for jobs owned by a previous process lifetime.
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, GradingJob>>,
    jobs_dir: PathBuf,
}

impl JobRegistry {
    pub fn new(jobs_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let jobs_dir = jobs_dir.into();
        std::fs::create_dir_all(&jobs_dir)?;
        Ok(Self {
            jobs: RwLock::new(HashMap::new()),
            jobs_dir,
        })
    }

    pub fn jobs_dir(&self) -> &Path {
        &self.jobs_dir
    }

    fn status_path(&self, job_id: &str) -> PathBuf {
        self.jobs_dir.join(format!("{job_id}.status"))
    }

    /// Register a new job with `status = processing`.
    ///
    /// The in-memory record is authoritative while the process lives; a
    /// failed durable write is logged and tolerated.
    pub async fn create(&self, job: GradingJob) {
        let job_id = job.job_id.clone();
        match self.jobs.write() {
            Ok(mut jobs) => {
                jobs.insert(job_id.clone(), job);
            }
            Err(e) => tracing::error!("RwLock poisoned writing jobs map: {e}"),
        }
        self.write_durable(&job_id, &JobStatusRecord::processing()).await;
    }

    /// Transition a job to `complete` with its results URL.
    pub async fn complete(&self, job_id: &str, results_url: String) {
        let record = {
            let mut jobs = match self.jobs.write() {
                Ok(jobs) => jobs,
                Err(e) => {
                    tracing::error!("RwLock poisoned writing jobs map: {e}");
                    return;
                }
            };
            match jobs.get_mut(job_id) {
                Some(job) if job.status == JobStatus::Processing => {
                    job.status = JobStatus::Complete;
                    job.results_url = Some(results_url.clone());
                    job.end_time = Some(Utc::now());
                    Some(JobStatusRecord::complete(results_url))
                }
                Some(job) => {
                    tracing::warn!(
                        job_id = %job_id,
                        status = ?job.status,
                        "ignoring complete() on a job already in a terminal state"
                    );
                    None
                }
                None => {
                    tracing::warn!(job_id = %job_id, "complete() for unknown job");
                    None
                }
            }
        };
        if let Some(record) = record {
            self.write_durable(job_id, &record).await;
        }
    }

    /// Transition a job to `error` with a diagnostic message.
    pub async fn fail(&self, job_id: &str, error: String) {
        let record = {
            let mut jobs = match self.jobs.write() {
                Ok(jobs) => jobs,
                Err(e) => {
                    tracing::error!("RwLock poisoned writing jobs map: {e}");
                    return;
                }
            };
            match jobs.get_mut(job_id) {
                Some(job) if job.status == JobStatus::Processing => {
                    job.status = JobStatus::Error;
                    job.error = Some(error.clone());
                    job.end_time = Some(Utc::now());
                    Some(JobStatusRecord::failed(error))
                }
                Some(job) => {
                    tracing::warn!(
                        job_id = %job_id,
                        status = ?job.status,
                        "ignoring fail() on a job already in a terminal state"
                    );
                    None
                }
                None => {
                    tracing::warn!(job_id = %job_id, "fail() for unknown job");
                    None
                }
            }
        };
        if let Some(record) = record {
            self.write_durable(job_id, &record).await;
        }
    }

    /// Look a job up: memory first, then the durable record.
    pub async fn lookup(&self, job_id: &str) -> Option<JobSnapshot> {
        match self.jobs.read() {
            Ok(jobs) => {
                if let Some(job) = jobs.get(job_id) {
                    return Some(job.snapshot());
                }
            }
            Err(e) => tracing::error!("RwLock poisoned reading jobs map: {e}"),
        }

        let content = tokio::fs::read_to_string(self.status_path(job_id))
            .await
            .ok()?;
        parse_durable(&content)
    }

    async fn write_durable(&self, job_id: &str, record: &JobStatusRecord) {
        let payload = match serde_json::to_string(record) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "failed to encode job status record");
                return;
            }
        };
        if let Err(e) = tokio::fs::write(self.status_path(job_id), payload).await {
            tracing::warn!(job_id = %job_id, error = %e, "failed to write durable job status");
        }
    }
}

/// Structured parse first, then the bare-status fallback for legacy files
/// that stored the literal status string.
fn parse_durable(content: &str) -> Option<JobSnapshot> {
    if let Ok(record) = serde_json::from_str::<JobStatusRecord>(content) {
        return Some(record.into_snapshot());
    }
    JobStatus::from_bare(content).map(|status| JobSnapshot {
        status,
        results_url: None,
        error: None,
    })
}
