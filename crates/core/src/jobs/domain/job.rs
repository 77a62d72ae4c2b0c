use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::detection::domain::smile_result::SmileSummary;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// Allowed moves: queued → processing → completed | error.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Error)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state change requested by the job's worker.
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    Start,
    Complete {
        output_path: PathBuf,
        summary: SmileSummary,
    },
    Fail {
        message: String,
    },
}

impl Transition {
    pub fn target(&self) -> JobStatus {
        match self {
            Transition::Start => JobStatus::Processing,
            Transition::Complete { .. } => JobStatus::Completed,
            Transition::Fail { .. } => JobStatus::Error,
        }
    }
}

/// Status record of one uploaded video.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Job {
    pub id: String,
    pub filename: String,
    pub input_path: PathBuf,
    /// Set once processing completes.
    pub output_path: Option<PathBuf>,
    pub status: JobStatus,
    /// 0–100.
    pub progress: u8,
    pub error: Option<String>,
    pub summary: Option<SmileSummary>,
}

impl Job {
    pub fn new(id: impl Into<String>, filename: impl Into<String>, input_path: PathBuf) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            input_path,
            output_path: None,
            status: JobStatus::Queued,
            progress: 0,
            error: None,
            summary: None,
        }
    }

    /// Applies `transition` if the state machine allows it.
    ///
    /// Returns the rejected target status otherwise.
    pub fn apply(&mut self, transition: Transition) -> Result<(), JobStatus> {
        let target = transition.target();
        if !self.status.can_transition_to(target) {
            return Err(target);
        }

        match transition {
            Transition::Start => {}
            Transition::Complete {
                output_path,
                summary,
            } => {
                self.output_path = Some(output_path);
                self.summary = Some(summary);
                self.progress = 100;
            }
            Transition::Fail { message } => {
                self.error = Some(message);
            }
        }
        self.status = target;
        Ok(())
    }
}
