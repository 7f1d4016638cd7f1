//! Common utilities and types for the localizer

use serde::{Deserialize, Serialize};

/// AprilTag identifier as reported by the detector.
pub type TagId = u32;

/// A planar pose in the field frame: meters and radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Pose2D { x, y, heading }
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.heading.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_pose_is_not_finite() {
        assert!(Pose2D::new(1.0, 2.0, 0.0).is_finite());
        assert!(!Pose2D::new(f64::NAN, 2.0, 0.0).is_finite());
        assert!(!Pose2D::new(0.0, 0.0, f64::INFINITY).is_finite());
    }
}
