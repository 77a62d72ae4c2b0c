use ab_glyph::{Font, FontRef, InvalidFont, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::smile_result::SmileResult;
use crate::shared::frame::Frame;

static LABEL_FONT: &[u8] = include_bytes!("../../../assets/fonts/DejaVuSans-Bold.ttf");

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const MOUTH_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const LABEL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const BOX_THICKNESS: i32 = 2;
const MOUTH_DOT_RADIUS: i32 = 2;
/// Distance from the label baseline to the top of the face box.
const LABEL_OFFSET: i32 = 10;
const LABEL_SIZE: f32 = 16.0;

/// Draws face boxes, mouth points and a `Smile: 0.00` label per face.
#[derive(Clone, Debug)]
pub struct OverlayAnnotator {
    font: FontRef<'static>,
}

impl OverlayAnnotator {
    pub fn new() -> Result<Self, InvalidFont> {
        Ok(Self {
            font: FontRef::try_from_slice(LABEL_FONT)?,
        })
    }

    fn draw(&self, img: &mut RgbImage, result: &SmileResult) {
        let face = &result.face;
        for inset in 0..BOX_THICKNESS {
            let w = face.width - 2 * inset;
            let h = face.height - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(face.x + inset, face.y + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(img, rect, BOX_COLOR);
        }

        for p in &result.mouth_points {
            draw_filled_circle_mut(img, (p.x, p.y), MOUTH_DOT_RADIUS, MOUTH_COLOR);
        }

        // draw_text_mut positions the top of the line; the baseline sits one ascent below.
        let scale = PxScale::from(LABEL_SIZE);
        let ascent = self.font.as_scaled(scale).ascent().round() as i32;
        let label = format!("Smile: {:.2}", result.smile_probability);
        draw_text_mut(
            img,
            LABEL_COLOR,
            face.x,
            face.y - LABEL_OFFSET - ascent,
            scale,
            &self.font,
            &label,
        );
    }
}

impl FrameAnnotator for OverlayAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        results: &[SmileResult],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if results.is_empty() {
            return Ok(());
        }
        let mut img = frame
            .to_rgb_image()
            .ok_or_else(|| format!("cannot annotate {}-channel frame", frame.channels()))?;

        for result in results {
            self.draw(&mut img, result);
        }

        frame.data_mut().copy_from_slice(img.as_raw());
        Ok(())
    }
}
