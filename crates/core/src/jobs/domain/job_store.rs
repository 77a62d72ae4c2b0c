use thiserror::Error;

use super::job::{Job, JobStatus, Transition};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobStoreError {
    #[error("job {0} already exists")]
    Duplicate(String),
    #[error("job {0} not found")]
    NotFound(String),
    #[error("job {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },
    #[error("job {0} is not processing")]
    NotProcessing(String),
}

/// Keyed job status records.
///
/// After a job is dequeued its worker is the only writer; readers get
/// snapshots.
pub trait JobStore: Send + Sync {
    fn create(&self, job: Job) -> Result<(), JobStoreError>;

    fn get(&self, id: &str) -> Option<Job>;

    /// Applies a state transition and returns the updated snapshot.
    fn transition(&self, id: &str, transition: Transition) -> Result<Job, JobStoreError>;

    /// Sets the progress of a processing job, capped at 100.
    fn update_progress(&self, id: &str, percent: u8) -> Result<(), JobStoreError>;

    /// Drops a job that never reached a worker.
    fn remove(&self, id: &str) -> Option<Job>;
}
