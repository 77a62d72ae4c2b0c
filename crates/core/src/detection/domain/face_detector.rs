use crate::shared::face_region::FaceRegion;
use crate::shared::frame::Frame;

/// Domain interface for face detection.
///
/// Detection is frame-local: implementations keep no memory across
/// frames. `&mut self` is required because inference sessions are
/// mutable.
pub trait FaceDetector: Send {
    /// Returns faces in the detector's own order.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>>;
}
