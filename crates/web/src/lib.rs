//! Upload, poll and view flow on top of the job worker pool.

pub mod config;
pub mod error;
pub mod handlers;
pub mod pages;
pub mod routes;
pub mod state;

pub use config::WebConfig;
pub use routes::create_router;
pub use state::AppState;
