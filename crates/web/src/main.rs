use std::process;
use std::sync::Arc;

use smilecheck_core::jobs::domain::job_runner::JobRunner;
use smilecheck_core::jobs::domain::job_store::JobStore;
use smilecheck_core::jobs::infrastructure::in_memory_job_store::InMemoryJobStore;
use smilecheck_core::jobs::infrastructure::video_job_runner::VideoJobRunner;
use smilecheck_core::jobs::infrastructure::worker_pool::{RunnerFactory, WorkerPool};
use smilecheck_core::pipeline::infrastructure::analyzer_factory::{
    create_analyzer, resolve_models,
};
use smilecheck_core::pipeline::process_video_use_case::ProcessVideoUseCase;
use smilecheck_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use smilecheck_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;

use smilecheck_web::{create_router, AppState, WebConfig};

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("{e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = WebConfig::from_env();
    std::fs::create_dir_all(&config.upload_dir)?;
    std::fs::create_dir_all(&config.processed_dir)?;

    let models_dir = config.models_dir.clone();
    let urls = config.model_urls.clone();
    let paths =
        tokio::task::spawn_blocking(move || resolve_models(models_dir.as_deref(), &urls, |_| None))
            .await??;

    let confidence = config.confidence;
    let factory: Arc<RunnerFactory> = Arc::new(
        move |worker: usize| -> Result<Box<dyn JobRunner>, Box<dyn std::error::Error>> {
            let analyzer = create_analyzer(&paths, confidence)?;
            log::info!("Worker {worker} ready");
            Ok(Box::new(VideoJobRunner::new(ProcessVideoUseCase::new(
                Box::new(FfmpegReader::new()),
                Box::new(FfmpegWriter::new()),
                analyzer,
            ))))
        },
    );

    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let pool = WorkerPool::start(
        config.workers,
        config.queue_capacity,
        store.clone(),
        factory,
    );

    let address = config.bind_address();
    let app = create_router(AppState::new(config, store, pool));
    let listener = tokio::net::TcpListener::bind(&address).await?;
    log::info!("Listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Shutting down");
        })
        .await?;
    Ok(())
}
