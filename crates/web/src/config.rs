use std::path::PathBuf;
use std::str::FromStr;

use smilecheck_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;
use smilecheck_core::pipeline::infrastructure::analyzer_factory::ModelUrls;
use smilecheck_core::shared::constants::MAX_UPLOAD_BYTES;

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub processed_dir: PathBuf,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    pub workers: usize,
    /// Jobs that may wait for a worker before uploads are refused.
    pub queue_capacity: usize,
    /// Model directory; the platform cache when unset.
    pub models_dir: Option<PathBuf>,
    pub model_urls: ModelUrls,
    pub confidence: f64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            processed_dir: PathBuf::from("processed"),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            workers: 2,
            queue_capacity: 16,
            models_dir: None,
            model_urls: ModelUrls::default(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

impl WebConfig {
    /// Reads `SMILECHECK_*` variables, falling back to defaults for unset
    /// or unparsable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("SMILECHECK_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "SMILECHECK_PORT").unwrap_or(defaults.port),
            upload_dir: lookup("SMILECHECK_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            processed_dir: lookup("SMILECHECK_PROCESSED_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.processed_dir),
            max_upload_bytes: parse_var(&lookup, "SMILECHECK_MAX_UPLOAD")
                .unwrap_or(defaults.max_upload_bytes),
            workers: parse_var(&lookup, "SMILECHECK_WORKERS")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.workers),
            queue_capacity: parse_var(&lookup, "SMILECHECK_QUEUE_CAPACITY")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.queue_capacity),
            models_dir: lookup("SMILECHECK_MODELS_DIR").map(PathBuf::from),
            model_urls: ModelUrls {
                face: lookup("SMILECHECK_FACE_MODEL_URL").unwrap_or(defaults.model_urls.face),
                fallback: lookup("SMILECHECK_FALLBACK_MODEL_URL")
                    .unwrap_or(defaults.model_urls.fallback),
                landmark: lookup("SMILECHECK_LANDMARK_MODEL_URL")
                    .unwrap_or(defaults.model_urls.landmark),
            },
            confidence: parse_var(&lookup, "SMILECHECK_CONFIDENCE")
                .filter(|c: &f64| (0.0..=1.0).contains(c))
                .unwrap_or(defaults.confidence),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}
