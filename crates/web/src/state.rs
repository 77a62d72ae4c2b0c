use std::sync::Arc;

use smilecheck_core::jobs::domain::job_store::JobStore;
use smilecheck_core::jobs::infrastructure::worker_pool::WorkerPool;

use crate::config::WebConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WebConfig>,
    pub store: Arc<dyn JobStore>,
    pub pool: Arc<WorkerPool>,
}

impl AppState {
    pub fn new(config: WebConfig, store: Arc<dyn JobStore>, pool: WorkerPool) -> Self {
        Self {
            config: Arc::new(config),
            store,
            pool: Arc::new(pool),
        }
    }
}
