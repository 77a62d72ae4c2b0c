use std::path::PathBuf;

use crate::detection::domain::smile_result::SmileSummary;

/// Work item handed to the worker pool.
#[derive(Clone, Debug, PartialEq)]
pub struct JobTask {
    pub id: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

/// Processes one job end to end on the calling thread.
pub trait JobRunner: Send {
    /// `progress` receives whole percentages as frames complete.
    fn run(
        &mut self,
        task: &JobTask,
        progress: &mut dyn FnMut(u8),
    ) -> Result<SmileSummary, Box<dyn std::error::Error>>;
}
