use crate::detection::domain::smile_result::SmileResult;
use crate::shared::frame::Frame;

/// Draws per-face smile results onto a frame.
///
/// Implementations modify the frame in place; callers hand in a copy when
/// the original must survive.
pub trait FrameAnnotator: Send {
    fn annotate(
        &self,
        frame: &mut Frame,
        results: &[SmileResult],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
