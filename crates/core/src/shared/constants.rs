pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const FALLBACK_FACE_MODEL_NAME: &str = "blazeface_short_range.onnx";
/// No published build exists; deployments override this through
/// `--fallback-model-url` or `SMILECHECK_FALLBACK_MODEL_URL`.
pub const FALLBACK_FACE_MODEL_URL: &str =
    "https://models.invalid/blazeface_short_range.onnx";

pub const LANDMARK_MODEL_NAME: &str = "face_landmarks_68.onnx";
/// No published build exists; deployments override this through
/// `--landmark-model-url` or `SMILECHECK_LANDMARK_MODEL_URL`, or place the
/// model in the models directory.
pub const LANDMARK_MODEL_URL: &str = "https://models.invalid/face_landmarks_68.onnx.bz2";

/// FourCC of the MPEG-4 part 2 stream the writer produces. Informational:
/// the muxer picks the container tag, this value only appears in logs.
pub const OUTPUT_FOURCC: &str = "mp4v";

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "wmv", "mkv"];

/// Upload cap for the web flow.
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;
