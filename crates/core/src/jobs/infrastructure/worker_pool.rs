use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use thiserror::Error;

use crate::jobs::domain::job::{Job, Transition};
use crate::jobs::domain::job_runner::{JobRunner, JobTask};
use crate::jobs::domain::job_store::{JobStore, JobStoreError};

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("job queue is full")]
    QueueFull,
    #[error("worker pool has shut down")]
    Closed,
    #[error(transparent)]
    Store(#[from] JobStoreError),
}

/// Builds the runner owned by one worker thread; called on that thread
/// with the worker's index.
pub type RunnerFactory =
    dyn Fn(usize) -> Result<Box<dyn JobRunner>, Box<dyn std::error::Error>> + Send + Sync;

/// Fixed set of worker threads fed from a bounded queue.
///
/// Each worker owns its runner and processes one job at a time, reporting
/// state and progress through the job store. Every accepted job reaches a
/// terminal state, including when the runner cannot be built or panics.
pub struct WorkerPool {
    sender: Option<Sender<JobTask>>,
    handles: Vec<JoinHandle<()>>,
    store: Arc<dyn JobStore>,
}

impl WorkerPool {
    pub fn start(
        workers: usize,
        queue_capacity: usize,
        store: Arc<dyn JobStore>,
        factory: Arc<RunnerFactory>,
    ) -> Self {
        if cfg!(panic = "abort") {
            log::warn!("Built with panic=abort: a panicking job takes the process down");
        }
        let (sender, receiver) = crossbeam_channel::bounded::<JobTask>(queue_capacity);

        let handles = (0..workers.max(1))
            .map(|index| {
                let receiver = receiver.clone();
                let store = store.clone();
                let factory = factory.clone();
                std::thread::Builder::new()
                    .name(format!("smile-worker-{index}"))
                    .spawn(move || worker_loop(index, receiver, store, factory))
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(e) => {
                    log::error!("Failed to spawn worker thread: {e}");
                    None
                }
            })
            .collect();

        Self {
            sender: Some(sender),
            handles,
            store,
        }
    }

    /// Registers `job` as queued and enqueues `task` without blocking.
    ///
    /// On a full queue the job record is removed again and
    /// `SubmitError::QueueFull` is returned.
    pub fn try_submit(&self, job: Job, task: JobTask) -> Result<(), SubmitError> {
        let sender = self.sender.as_ref().ok_or(SubmitError::Closed)?;
        let id = job.id.clone();
        self.store.create(job)?;

        match sender.try_send(task) {
            Ok(()) => {
                log::info!("Job {id} queued");
                Ok(())
            }
            Err(e) => {
                self.store.remove(&id);
                Err(match e {
                    TrySendError::Full(_) => SubmitError::QueueFull,
                    TrySendError::Disconnected(_) => SubmitError::Closed,
                })
            }
        }
    }

    /// Stops accepting work, lets workers drain the queue, and joins them.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.sender = None;
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                log::error!("Worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(
    index: usize,
    receiver: Receiver<JobTask>,
    store: Arc<dyn JobStore>,
    factory: Arc<RunnerFactory>,
) {
    let mut runner = match factory(index) {
        Ok(runner) => Some(runner),
        Err(e) => {
            log::error!("Worker {index}: could not build runner: {e}");
            None
        }
    };
    let build_error = "analyzer unavailable on this worker";

    for task in receiver.iter() {
        if let Err(e) = store.transition(&task.id, Transition::Start) {
            log::warn!("Worker {index}: skipping job {}: {e}", task.id);
            continue;
        }

        let outcome = match runner.as_mut() {
            Some(runner) => run_task(runner.as_mut(), &task, &*store),
            None => Err(build_error.to_string()),
        };

        let transition = match outcome {
            Ok(summary) => Transition::Complete {
                output_path: task.output_path.clone(),
                summary,
            },
            Err(message) => {
                log::error!("Job {} failed: {message}", task.id);
                Transition::Fail { message }
            }
        };
        if let Err(e) = store.transition(&task.id, transition) {
            log::error!("Worker {index}: {e}");
        }
    }
    log::debug!("Worker {index} stopped");
}

fn run_task(
    runner: &mut dyn JobRunner,
    task: &JobTask,
    store: &dyn JobStore,
) -> Result<crate::detection::domain::smile_result::SmileSummary, String> {
    let mut report = |p: u8| {
        if let Err(e) = store.update_progress(&task.id, p) {
            log::warn!("{e}");
        }
    };

    match catch_unwind(AssertUnwindSafe(|| runner.run(task, &mut report))) {
        Ok(Ok(summary)) => Ok(summary),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("worker panicked while processing".to_string()),
    }
}
