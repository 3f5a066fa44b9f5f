use std::sync::Arc;

use crate::services::registry::JobRegistry;
use crate::services::runner::JobRunner;
use crate::services::storage::FileStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<JobRegistry>,
    pub storage: Arc<FileStore>,
    pub runner: Arc<JobRunner>,
}

impl AppState {
    pub fn new(registry: Arc<JobRegistry>, storage: Arc<FileStore>, runner: JobRunner) -> Self {
        Self {
            registry,
            storage,
            runner: Arc::new(runner),
        }
    }
}
