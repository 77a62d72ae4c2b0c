//! 68-point facial landmarks in the iBUG 300-W layout.
//!
//! Indices 48..=67 cover the mouth: 48..=59 trace the outer lip contour
//! starting at the left corner, 60..=67 the inner contour.

use crate::shared::face_region::Point;

pub const LANDMARK_COUNT: usize = 68;
pub const MOUTH_START: usize = 48;
pub const MOUTH_POINT_COUNT: usize = 20;

#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<Point>,
}

impl FaceLandmarks {
    /// Returns `None` unless exactly 68 points are supplied.
    pub fn new(points: Vec<Point>) -> Option<Self> {
        if points.len() != LANDMARK_COUNT {
            return None;
        }
        Some(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The 20 mouth points in model order.
    pub fn mouth(&self) -> [Point; MOUTH_POINT_COUNT] {
        let mut mouth = [Point::default(); MOUTH_POINT_COUNT];
        mouth.copy_from_slice(&self.points[MOUTH_START..MOUTH_START + MOUTH_POINT_COUNT]);
        mouth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered() -> Vec<Point> {
        (0..LANDMARK_COUNT as i32).map(|i| Point::new(i, -i)).collect()
    }

    #[test]
    fn test_new_requires_68_points() {
        assert!(FaceLandmarks::new(numbered()).is_some());
        assert!(FaceLandmarks::new(vec![Point::default(); 67]).is_none());
        assert!(FaceLandmarks::new(vec![Point::default(); 69]).is_none());
        assert!(FaceLandmarks::new(Vec::new()).is_none());
    }

    #[test]
    fn test_mouth_is_points_48_to_67() {
        let landmarks = FaceLandmarks::new(numbered()).unwrap();
        let mouth = landmarks.mouth();
        assert_eq!(mouth[0], Point::new(48, -48));
        assert_eq!(mouth[19], Point::new(67, -67));
        assert_eq!(landmarks.points().len(), 68);
    }
}
