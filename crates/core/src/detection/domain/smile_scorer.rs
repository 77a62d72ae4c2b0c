//! Geometric smile heuristic over the 20 mouth landmarks.
//!
//! Mouth points are indexed relative to landmark 48: 0 and 6 are the lip
//! corners, 3 and 5 sit on the upper outer lip, 9 and 11 on the lower
//! outer lip. A wide, flat mouth (high width/height ratio) reads as a
//! smile.

use crate::detection::domain::face_landmarks::MOUTH_POINT_COUNT;
use crate::shared::face_region::Point;

/// Ratio at or below which the probability is 0.
pub const MIN_RATIO: f64 = 2.0;
/// Ratio at or above which the probability is 1.
pub const MAX_RATIO: f64 = 5.0;

/// Width over height of the mouth. 0 when the height is 0.
pub fn mouth_ratio(mouth: &[Point; MOUTH_POINT_COUNT]) -> f64 {
    let width = (mouth[6].x - mouth[0].x).abs() as f64;
    let upper = (mouth[3].y + mouth[5].y) as f64 / 2.0;
    let lower = (mouth[9].y + mouth[11].y) as f64 / 2.0;
    let height = (lower - upper).abs();

    if height == 0.0 {
        return 0.0;
    }
    width / height
}

/// Maps a mouth ratio linearly onto [0, 1] between the two thresholds.
/// Non-finite ratios map to 0.
pub fn probability_from_ratio(ratio: f64) -> f64 {
    if !ratio.is_finite() || ratio <= MIN_RATIO {
        return 0.0;
    }
    if ratio >= MAX_RATIO {
        return 1.0;
    }
    (ratio - MIN_RATIO) / (MAX_RATIO - MIN_RATIO)
}

pub fn smile_probability(mouth: &[Point; MOUTH_POINT_COUNT]) -> f64 {
    probability_from_ratio(mouth_ratio(mouth))
}
