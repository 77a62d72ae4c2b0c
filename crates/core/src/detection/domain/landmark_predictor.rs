use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::face_region::FaceRegion;
use crate::shared::frame::Frame;

/// Domain interface for 68-point landmark extraction inside a face region.
pub trait LandmarkPredictor: Send {
    fn predict(
        &mut self,
        frame: &Frame,
        face: &FaceRegion,
    ) -> Result<FaceLandmarks, Box<dyn std::error::Error>>;
}
