/// 68-point landmark regressor using ONNX Runtime via `ort`.
///
/// The model takes a square RGB crop of the face, NCHW float32 in [0,1],
/// and outputs 136 values: `(x, y)` pairs normalized to the crop.
use std::path::Path;

use crate::detection::domain::face_landmarks::{FaceLandmarks, LANDMARK_COUNT};
use crate::detection::domain::landmark_predictor::LandmarkPredictor;
use crate::shared::face_region::{FaceRegion, Point};
use crate::shared::frame::Frame;

use super::execution_provider::{load_session, square_input_size};

/// Crop resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 112;

pub struct OnnxLandmarkPredictor {
    session: ort::session::Session,
    input_size: u32,
}

impl OnnxLandmarkPredictor {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        let input_size = square_input_size(&session).unwrap_or(DEFAULT_INPUT_SIZE);
        Ok(Self {
            session,
            input_size,
        })
    }
}

impl LandmarkPredictor for OnnxLandmarkPredictor {
    fn predict(
        &mut self,
        frame: &Frame,
        face: &FaceRegion,
    ) -> Result<FaceLandmarks, Box<dyn std::error::Error>> {
        let input_tensor = crop_tensor(frame, face, self.input_size)
            .ok_or_else(|| format!("face region {face:?} lies outside the frame"))?;

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("landmark model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        to_landmarks(data, face)
    }
}

/// Nearest-neighbour resize of the face crop into a `[1, 3, size, size]`
/// tensor. `None` if the region has no overlap with the frame.
fn crop_tensor(frame: &Frame, face: &FaceRegion, size: u32) -> Option<ndarray::Array4<f32>> {
    let fw = frame.width() as i32;
    let fh = frame.height() as i32;
    let x1 = face.x.clamp(0, fw);
    let y1 = face.y.clamp(0, fh);
    let x2 = face.right().clamp(0, fw);
    let y2 = face.bottom().clamp(0, fh);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    let src = frame.as_ndarray();
    let channels = frame.channels() as usize;
    let crop_w = (x2 - x1) as f64;
    let crop_h = (y2 - y1) as f64;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));
    for y in 0..s {
        let src_y = y1 as usize + (((y as f64 + 0.5) * crop_h / s as f64) as usize).min(crop_h as usize - 1);
        for x in 0..s {
            let src_x =
                x1 as usize + (((x as f64 + 0.5) * crop_w / s as f64) as usize).min(crop_w as usize - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c.min(channels - 1)]] as f32 / 255.0;
            }
        }
    }
    Some(tensor)
}

/// Maps crop-normalized `(x, y)` pairs back to rounded frame pixels.
fn to_landmarks(
    data: &[f32],
    face: &FaceRegion,
) -> Result<FaceLandmarks, Box<dyn std::error::Error>> {
    if data.len() < LANDMARK_COUNT * 2 {
        return Err(format!(
            "landmark model returned {} values, expected {}",
            data.len(),
            LANDMARK_COUNT * 2
        )
        .into());
    }

    let points = data[..LANDMARK_COUNT * 2]
        .chunks_exact(2)
        .map(|xy| {
            Point::new(
                (face.x as f64 + xy[0] as f64 * face.width as f64).round() as i32,
                (face.y as f64 + xy[1] as f64 * face.height as f64).round() as i32,
            )
        })
        .collect();

    FaceLandmarks::new(points).ok_or_else(|| "landmark count mismatch".into())
}
