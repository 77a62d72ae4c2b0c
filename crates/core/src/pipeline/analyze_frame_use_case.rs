use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::landmark_predictor::LandmarkPredictor;
use crate::detection::domain::smile_result::SmileResult;
use crate::detection::domain::smile_scorer::smile_probability;
use crate::shared::frame::Frame;

/// Per-frame smile analysis: detect, predict landmarks, score, annotate.
///
/// The fallback detector only runs when the primary one finds no faces;
/// the two are never merged. Detection and landmark prediction both see
/// the grayscale frame, annotation draws on a copy of the colour frame.
pub struct FrameAnalyzer {
    detector: Box<dyn FaceDetector>,
    fallback: Option<Box<dyn FaceDetector>>,
    predictor: Box<dyn LandmarkPredictor>,
    annotator: Box<dyn FrameAnnotator>,
}

impl FrameAnalyzer {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        fallback: Option<Box<dyn FaceDetector>>,
        predictor: Box<dyn LandmarkPredictor>,
        annotator: Box<dyn FrameAnnotator>,
    ) -> Self {
        Self {
            detector,
            fallback,
            predictor,
            annotator,
        }
    }

    /// Returns the annotated copy and per-face results in detection order.
    ///
    /// A landmark failure drops only that face. A detector or annotator
    /// failure fails the whole frame.
    pub fn analyze(
        &mut self,
        frame: &Frame,
    ) -> Result<(Frame, Vec<SmileResult>), Box<dyn std::error::Error>> {
        let gray = frame.to_grayscale();

        let mut faces = self.detector.detect(&gray)?;
        if faces.is_empty() {
            if let Some(fallback) = self.fallback.as_mut() {
                faces = fallback.detect(&gray)?;
                if !faces.is_empty() {
                    log::debug!(
                        "Frame {}: fallback detector found {} face(s)",
                        frame.index(),
                        faces.len()
                    );
                }
            }
        }

        let mut results = Vec::with_capacity(faces.len());
        for face in faces {
            let landmarks = match self.predictor.predict(&gray, &face) {
                Ok(landmarks) => landmarks,
                Err(e) => {
                    log::warn!(
                        "Frame {}: skipping face at ({}, {}): {e}",
                        frame.index(),
                        face.x,
                        face.y
                    );
                    continue;
                }
            };
            let mouth_points = landmarks.mouth();
            results.push(SmileResult {
                face,
                smile_probability: smile_probability(&mouth_points),
                mouth_points,
            });
        }

        let mut annotated = frame.clone();
        self.annotator.annotate(&mut annotated, &results)?;

        Ok((annotated, results))
    }
}
