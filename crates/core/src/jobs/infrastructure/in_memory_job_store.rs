use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::jobs::domain::job::{Job, JobStatus, Transition};
use crate::jobs::domain::job_store::{JobStore, JobStoreError};

/// Process-local job store behind a single mutex.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<String, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Job>> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl JobStore for InMemoryJobStore {
    fn create(&self, job: Job) -> Result<(), JobStoreError> {
        let mut jobs = self.lock();
        if jobs.contains_key(&job.id) {
            return Err(JobStoreError::Duplicate(job.id));
        }
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    fn get(&self, id: &str) -> Option<Job> {
        self.lock().get(id).cloned()
    }

    fn transition(&self, id: &str, transition: Transition) -> Result<Job, JobStoreError> {
        let mut jobs = self.lock();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobStoreError::NotFound(id.to_string()))?;

        let from = job.status;
        job.apply(transition)
            .map_err(|to| JobStoreError::InvalidTransition {
                id: id.to_string(),
                from,
                to,
            })?;
        log::debug!("Job {id}: {from} -> {}", job.status);
        Ok(job.clone())
    }

    fn update_progress(&self, id: &str, percent: u8) -> Result<(), JobStoreError> {
        let mut jobs = self.lock();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobStoreError::NotFound(id.to_string()))?;
        if job.status != JobStatus::Processing {
            return Err(JobStoreError::NotProcessing(id.to_string()));
        }
        job.progress = percent.min(100);
        Ok(())
    }

    fn remove(&self, id: &str) -> Option<Job> {
        self.lock().remove(id)
    }
}
