use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use smilecheck_core::detection::domain::smile_result::{
    FrameResult, SmileResult, SmileSummary,
};
use smilecheck_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;
use smilecheck_core::pipeline::infrastructure::analyzer_factory::{
    create_analyzer, resolve_models, ModelUrls,
};
use smilecheck_core::pipeline::process_video_use_case::ProcessVideoUseCase;
use smilecheck_core::shared::constants::{
    FACE_MODEL_URL, FALLBACK_FACE_MODEL_URL, LANDMARK_MODEL_URL,
};
use smilecheck_core::shared::frame::Frame;
use smilecheck_core::shared::model_resolver::ProgressFn;
use smilecheck_core::shared::video_metadata::percent;
use smilecheck_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use smilecheck_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Frames between progress updates on stderr.
const PROGRESS_INTERVAL: usize = 10;

/// Smile detection for videos.
#[derive(Parser)]
#[command(name = "smilecheck")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Annotated output video (default: <input stem>_processed.mp4).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Analyze only; do not write an annotated video.
    #[arg(long, conflicts_with = "output")]
    no_output: bool,

    /// Write per-frame results as JSON to this file.
    #[arg(long)]
    results: Option<PathBuf>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Directory holding the model files instead of the user cache.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Download URL of the primary face detection model.
    #[arg(long, default_value = FACE_MODEL_URL)]
    face_model_url: String,

    /// Download URL of the fallback face detection model.
    #[arg(long, default_value = FALLBACK_FACE_MODEL_URL)]
    fallback_model_url: String,

    /// Download URL of the landmark model (may be .bz2).
    #[arg(long, default_value = LANDMARK_MODEL_URL)]
    landmark_model_url: String,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let urls = ModelUrls {
        face: cli.face_model_url.clone(),
        fallback: cli.fallback_model_url.clone(),
        landmark: cli.landmark_model_url.clone(),
    };
    let paths = resolve_models(cli.models_dir.as_deref(), &urls, download_progress)?;
    let analyzer = create_analyzer(&paths, cli.confidence)?;

    let output = output_path(&cli);
    let mut use_case = ProcessVideoUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(FfmpegWriter::new()),
        analyzer,
    );

    let results = use_case.process(
        &cli.input,
        output.as_deref(),
        frame_callback(cli.max_frames),
    )?;
    eprintln!();

    if let Some(path) = &output {
        log::info!("Output written to {}", path.display());
    }
    if let Some(path) = &cli.results {
        write_results(path, &results)?;
        log::info!("Results written to {}", path.display());
    }

    print_summary(&SmileSummary::from_results(&results));
    Ok(())
}

/// Prints progress every few frames and asks the pipeline to stop once
/// `max_frames` frames are done.
fn frame_callback(
    max_frames: Option<usize>,
) -> impl FnMut(usize, usize, &Frame, &[SmileResult]) -> bool {
    move |index: usize, total: usize, _: &Frame, _: &[SmileResult]| {
        let done = index + 1;
        if done % PROGRESS_INTERVAL == 0 {
            if total > 0 {
                eprint!("\rProcessing frame {done}/{total} ({}%)", percent(done, total));
            } else {
                eprint!("\rProcessing frame {done}");
            }
        }
        max_frames.map_or(true, |max| done < max)
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.max_frames == Some(0) {
        return Err("--max-frames must be at least 1".into());
    }
    Ok(())
}

fn output_path(cli: &Cli) -> Option<PathBuf> {
    if cli.no_output {
        return None;
    }
    Some(
        cli.output
            .clone()
            .unwrap_or_else(|| default_output(&cli.input)),
    )
}

/// `clips/party.mov` -> `party_processed.mp4` in the working directory.
fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    PathBuf::from(format!("{stem}_processed.mp4"))
}

fn write_results(path: &Path, results: &[FrameResult]) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(results)?;
    fs::write(path, json)?;
    Ok(())
}

fn print_summary(summary: &SmileSummary) {
    println!("Frames processed:     {}", summary.frames_processed);
    println!("Frames with faces:    {}", summary.frames_with_faces);
    println!("Faces detected:       {}", summary.faces_detected);
    println!(
        "Mean smile score:     {:.2}",
        summary.mean_smile_probability
    );
    println!(
        "Peak smile score:     {:.2}",
        summary.peak_smile_probability
    );
}

fn download_progress(name: &str) -> Option<ProgressFn> {
    let name = name.to_string();
    Some(Box::new(move |downloaded, total| {
        if total > 0 {
            let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
            eprint!("\rDownloading {name}... {pct}%");
        } else {
            eprint!("\rDownloading {name}... {downloaded} bytes");
        }
    }))
}
