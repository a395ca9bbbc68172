use std::sync::Arc;

use crate::services::registry::JobRegistry;
use crate::services::repository::ClassRepository;
use crate::services::submissions::SubmissionService;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<ClassRepository>,
    pub registry: Arc<JobRegistry>,
    pub submissions: Arc<SubmissionService>,
}

impl AppState {
    pub fn new(
        repo: Arc<ClassRepository>,
        registry: Arc<JobRegistry>,
        submissions: Arc<SubmissionService>,
    ) -> Self {
        Self {
            repo,
            registry,
            submissions,
        }
    }
}
