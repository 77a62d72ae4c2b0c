use std::path::{Path, PathBuf};

use crate::annotation::infrastructure::overlay_annotator::OverlayAnnotator;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::onnx_blazeface_detector::{
    self, OnnxBlazefaceDetector,
};
use crate::detection::infrastructure::onnx_landmark_predictor::OnnxLandmarkPredictor;
use crate::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use crate::pipeline::analyze_frame_use_case::FrameAnalyzer;
use crate::shared::constants::{
    FACE_MODEL_NAME, FACE_MODEL_URL, FALLBACK_FACE_MODEL_NAME, FALLBACK_FACE_MODEL_URL,
    LANDMARK_MODEL_NAME, LANDMARK_MODEL_URL,
};
use crate::shared::model_resolver::{self, ModelResolveError, ProgressFn};

/// Download locations of the three models.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelUrls {
    pub face: String,
    pub fallback: String,
    pub landmark: String,
}

impl Default for ModelUrls {
    fn default() -> Self {
        Self {
            face: FACE_MODEL_URL.to_string(),
            fallback: FALLBACK_FACE_MODEL_URL.to_string(),
            landmark: LANDMARK_MODEL_URL.to_string(),
        }
    }
}

/// Local paths of provisioned models.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelPaths {
    pub face: PathBuf,
    /// `None` when the fallback detector could not be provisioned.
    pub fallback: Option<PathBuf>,
    pub landmark: PathBuf,
}

/// Makes all models available locally, downloading what is missing.
///
/// With `models_dir` the models live directly in that directory; otherwise
/// the platform cache is used. The fallback detector is optional: a failure
/// to provision it is logged and analysis runs with the primary only.
pub fn resolve_models(
    models_dir: Option<&Path>,
    urls: &ModelUrls,
    progress: impl Fn(&str) -> Option<ProgressFn>,
) -> Result<ModelPaths, ModelResolveError> {
    let fetch = |name: &str, url: &str| -> Result<PathBuf, ModelResolveError> {
        log::info!("Resolving model: {name}");
        match models_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(ModelResolveError::CacheDir)?;
                model_resolver::ensure_model(&dir.join(name), url, progress(name))
            }
            None => model_resolver::resolve(name, url, None, progress(name)),
        }
    };

    let face = fetch(FACE_MODEL_NAME, &urls.face)?;
    let landmark = fetch(LANDMARK_MODEL_NAME, &urls.landmark)?;
    let fallback = match fetch(FALLBACK_FACE_MODEL_NAME, &urls.fallback) {
        Ok(path) => Some(path),
        Err(e) => {
            log::warn!("Continuing without fallback face detector: {e}");
            None
        }
    };

    Ok(ModelPaths {
        face,
        fallback,
        landmark,
    })
}

/// Builds a frame analyzer with its own inference sessions.
pub fn create_analyzer(
    paths: &ModelPaths,
    confidence: f64,
) -> Result<FrameAnalyzer, Box<dyn std::error::Error>> {
    let detector: Box<dyn FaceDetector> =
        Box::new(OnnxYoloDetector::new(&paths.face, confidence)?);
    let fallback: Option<Box<dyn FaceDetector>> = match &paths.fallback {
        Some(path) => Some(Box::new(OnnxBlazefaceDetector::new(
            path,
            onnx_blazeface_detector::DEFAULT_CONFIDENCE,
        )?)),
        None => None,
    };
    let predictor = Box::new(OnnxLandmarkPredictor::new(&paths.landmark)?);

    Ok(FrameAnalyzer::new(
        detector,
        fallback,
        predictor,
        Box::new(OverlayAnnotator::new()?),
    ))
}
