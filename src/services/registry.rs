use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::models::job::TranslationJob;

/// Concurrent store of job records.
///
/// Runners publish whole records (a fresh `Arc` replaces the old entry), so
/// status readers never observe a half-updated job. Runners for different
/// jobs touch disjoint entries; the lock only guards the map structure.
pub struct JobRegistry {
    jobs: RwLock<HashMap<Uuid, Arc<TranslationJob>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new job in phase `Pending`.
    pub fn create(&self, filename: String, target_lang: String) -> Arc<TranslationJob> {
        let job = Arc::new(TranslationJob::new(filename, target_lang));
        self.jobs
            .write()
            .expect("job registry lock poisoned")
            .insert(job.id, Arc::clone(&job));
        job
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<TranslationJob>> {
        self.jobs
            .read()
            .expect("job registry lock poisoned")
            .get(&id)
            .cloned()
    }

    /// Replace the stored record with an updated snapshot.
    pub fn publish(&self, job: TranslationJob) {
        self.jobs
            .write()
            .expect("job registry lock poisoned")
            .insert(job.id, Arc::new(job));
    }

    pub fn len(&self) -> usize {
        self.jobs.read().expect("job registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
