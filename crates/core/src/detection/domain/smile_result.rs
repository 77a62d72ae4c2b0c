use serde::Serialize;

use crate::detection::domain::face_landmarks::MOUTH_POINT_COUNT;
use crate::shared::face_region::{FaceRegion, Point};

/// Smile assessment for one detected face.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SmileResult {
    pub face: FaceRegion,
    /// In `[0, 1]`.
    pub smile_probability: f64,
    pub mouth_points: [Point; MOUTH_POINT_COUNT],
}

/// Per-frame results, in the detector's face order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FrameResult {
    pub frame_index: usize,
    pub results: Vec<SmileResult>,
}

/// Aggregate statistics over a processed video.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SmileSummary {
    pub frames_processed: usize,
    pub frames_with_faces: usize,
    pub faces_detected: usize,
    pub mean_smile_probability: f64,
    pub peak_smile_probability: f64,
}

impl SmileSummary {
    pub fn from_results(frames: &[FrameResult]) -> Self {
        let probabilities: Vec<f64> = frames
            .iter()
            .flat_map(|f| f.results.iter().map(|r| r.smile_probability))
            .collect();

        let mean = if probabilities.is_empty() {
            0.0
        } else {
            probabilities.iter().sum::<f64>() / probabilities.len() as f64
        };

        Self {
            frames_processed: frames.len(),
            frames_with_faces: frames.iter().filter(|f| !f.results.is_empty()).count(),
            faces_detected: probabilities.len(),
            mean_smile_probability: mean,
            peak_smile_probability: probabilities.iter().copied().fold(0.0, f64::max),
        }
    }
}
