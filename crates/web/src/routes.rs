use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::handlers::{index, processing, result, status, upload, video};
use crate::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let max_body = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route(
            "/upload",
            post(upload)
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_body)),
        )
        .route("/processing/:id", get(processing))
        .route("/status/:id", get(status))
        .route("/result/:id", get(result))
        .route("/video/:id", get(video))
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .nest_service("/processed", ServeDir::new(&state.config.processed_dir))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use crossbeam_channel::Receiver;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use smilecheck_core::detection::domain::smile_result::SmileSummary;
    use smilecheck_core::jobs::domain::job::{Job, JobStatus, Transition};
    use smilecheck_core::jobs::domain::job_runner::{JobRunner, JobTask};
    use smilecheck_core::jobs::domain::job_store::JobStore;
    use smilecheck_core::jobs::infrastructure::in_memory_job_store::InMemoryJobStore;
    use smilecheck_core::jobs::infrastructure::worker_pool::{RunnerFactory, WorkerPool};

    use super::*;
    use crate::config::WebConfig;

    const BOUNDARY: &str = "smilecheck-test-boundary";

    /// Completes every job after the gate opens, if one is set.
    struct StubRunner {
        gate: Option<Receiver<()>>,
    }

    impl JobRunner for StubRunner {
        fn run(
            &mut self,
            _task: &JobTask,
            progress: &mut dyn FnMut(u8),
        ) -> Result<SmileSummary, Box<dyn std::error::Error>> {
            if let Some(gate) = &self.gate {
                let _ = gate.recv();
            }
            progress(100);
            Ok(SmileSummary::default())
        }
    }

    struct Harness {
        _dirs: TempDir,
        config: WebConfig,
        store: Arc<InMemoryJobStore>,
        state: AppState,
    }

    impl Harness {
        fn new(queue_capacity: usize, gate: Option<Receiver<()>>) -> Self {
            let dirs = TempDir::new().unwrap();
            let config = WebConfig {
                upload_dir: dirs.path().join("uploads"),
                processed_dir: dirs.path().join("processed"),
                workers: 1,
                queue_capacity,
                ..WebConfig::default()
            };
            std::fs::create_dir_all(&config.upload_dir).unwrap();
            std::fs::create_dir_all(&config.processed_dir).unwrap();

            let store = Arc::new(InMemoryJobStore::new());
            let factory: Arc<RunnerFactory> = Arc::new(
                move |_: usize| -> Result<Box<dyn JobRunner>, Box<dyn std::error::Error>> {
                    Ok(Box::new(StubRunner { gate: gate.clone() }))
                },
            );
            let pool = WorkerPool::start(1, queue_capacity, store.clone(), factory);
            let state = AppState::new(config.clone(), store.clone(), pool);
            Self {
                _dirs: dirs,
                config,
                store,
                state,
            }
        }

        async fn send(&self, request: Request<Body>) -> axum::response::Response {
            create_router(self.state.clone()).oneshot(request).await.unwrap()
        }

        async fn get(&self, uri: &str) -> axum::response::Response {
            self.send(Request::get(uri).body(Body::empty()).unwrap()).await
        }

        async fn upload(&self, filename: &str) -> axum::response::Response {
            let body = format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"video\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n\
                 fake video bytes\r\n\
                 --{BOUNDARY}--\r\n"
            );
            let request = Request::post("/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .header(header::CONTENT_LENGTH, body.len())
                .body(Body::from(body))
                .unwrap();
            self.send(request).await
        }

        fn insert_completed(&self, id: &str) {
            self.store
                .create(Job::new(id, "clip.mp4", PathBuf::from("uploads/x.mp4")))
                .unwrap();
            self.store.transition(id, Transition::Start).unwrap();
            self.store
                .transition(
                    id,
                    Transition::Complete {
                        output_path: self.config.processed_dir.join(format!("{id}_processed.mp4")),
                        summary: SmileSummary::default(),
                    },
                )
                .unwrap();
        }

        async fn wait_for(&self, id: &str, status: JobStatus) {
            let deadline = Instant::now() + Duration::from_secs(5);
            while self.store.get(id).map(|j| j.status) != Some(status) {
                assert!(Instant::now() < deadline, "job {id} never reached {status}");
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
    }

    fn location(response: &axum::response::Response) -> String {
        response.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .to_string()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_index_serves_upload_form() {
        let h = Harness::new(4, None);
        let response = h.get("/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("action=\"/upload\""));
    }

    #[tokio::test]
    async fn test_upload_queues_and_completes_job() {
        let h = Harness::new(4, None);
        let response = h.upload("my clip.MP4").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let target = location(&response);
        let id = target.strip_prefix("/processing/").unwrap().to_string();

        let saved = h.config.upload_dir.join(format!("{id}.mp4"));
        assert_eq!(std::fs::read(&saved).unwrap(), b"fake video bytes");

        h.wait_for(&id, JobStatus::Completed).await;
        let job = h.store.get(&id).unwrap();
        assert_eq!(job.filename, "my_clip.MP4");
        assert_eq!(
            job.output_path,
            Some(h.config.processed_dir.join(format!("{id}_processed.mp4")))
        );

        let status = h.get(&format!("/status/{id}")).await;
        let json: serde_json::Value = serde_json::from_str(&body_text(status).await).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["progress"], 100);
    }

    #[tokio::test]
    async fn test_upload_with_unsupported_extension_redirects_home() {
        let h = Harness::new(4, None);
        let response = h.upload("notes.txt").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        assert_eq!(std::fs::read_dir(&h.config.upload_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_when_queue_full_is_503() {
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded::<()>();
        let h = Harness::new(1, Some(gate_rx));

        let first = location(&h.upload("a.mp4").await);
        let first_id = first.strip_prefix("/processing/").unwrap();
        h.wait_for(first_id, JobStatus::Processing).await;
        assert_eq!(h.upload("b.mp4").await.status(), StatusCode::SEE_OTHER);

        let rejected = h.upload("c.mp4").await;
        assert_eq!(rejected.status(), StatusCode::SERVICE_UNAVAILABLE);
        // Only the two accepted uploads remain on disk.
        assert_eq!(std::fs::read_dir(&h.config.upload_dir).unwrap().count(), 2);

        gate_tx.send(()).unwrap();
        gate_tx.send(()).unwrap();
    }

    #[tokio::test]
    async fn test_unknown_job_routes() {
        let h = Harness::new(4, None);

        let status = h.get("/status/nope").await;
        assert_eq!(status.status(), StatusCode::OK);
        assert_eq!(body_text(status).await, r#"{"status":"not_found"}"#);

        for uri in ["/processing/nope", "/result/nope", "/video/nope"] {
            let response = h.get(uri).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(location(&response), "/");
        }
    }

    #[tokio::test]
    async fn test_result_requires_completed_job() {
        let h = Harness::new(4, None);
        h.store
            .create(Job::new("queued", "clip.mp4", PathBuf::from("uploads/q.mp4")))
            .unwrap();

        let response = h.get("/result/queued").await;
        assert_eq!(location(&response), "/");
        assert_eq!(location(&h.get("/video/queued").await), "/");

        let processing = h.get("/processing/queued").await;
        assert_eq!(processing.status(), StatusCode::OK);
        assert!(body_text(processing).await.contains("/status/queued"));
    }

    #[tokio::test]
    async fn test_completed_job_result_and_video() {
        let h = Harness::new(4, None);
        h.insert_completed("done");

        let page = h.get("/result/done").await;
        assert_eq!(page.status(), StatusCode::OK);
        assert!(body_text(page).await.contains("src=\"/video/done\""));

        let video = h.get("/video/done").await;
        assert_eq!(location(&video), "/processed/done_processed.mp4");
    }

    #[tokio::test]
    async fn test_processed_files_are_served() {
        let h = Harness::new(4, None);
        std::fs::write(h.config.processed_dir.join("done_processed.mp4"), b"video").unwrap();

        let response = h.get("/processed/done_processed.mp4").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "video");
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let mut h = Harness::new(4, None);
        let mut config = h.config.clone();
        config.max_upload_bytes = 16;
        let store: Arc<dyn JobStore> = h.store.clone();
        let factory: Arc<RunnerFactory> = Arc::new(
            |_: usize| -> Result<Box<dyn JobRunner>, Box<dyn std::error::Error>> {
                Ok(Box::new(StubRunner { gate: None }))
            },
        );
        h.state = AppState::new(config, store.clone(), WorkerPool::start(1, 4, store, factory));

        let response = h.upload("big.mp4").await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
