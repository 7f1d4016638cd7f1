//! Detector output consumed by the localizer.
//!
//! The AprilTag detector and pose estimator run outside this crate. Each
//! detected marker arrives as a [`TagDetection`] holding up to two pose
//! candidates in the camera frame (X right, Y down, Z forward).

use crate::common::TagId;
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// One pose solution returned by the estimator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseCandidate {
    /// Tag position in the camera frame, meters.
    pub translation: Vector3<f64>,
    /// Axis-angle rotation of the tag in the camera frame.
    pub rotation: Vector3<f64>,
    /// Reprojection error reported for this solution.
    pub error: f64,
}

/// Candidate pose reduced to the quantities the field transform needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TagRelativePose {
    /// Depth along the optical axis.
    pub perpendicular: f64,
    /// Lateral offset.
    pub parallel: f64,
    /// Rotation about the camera's vertical axis.
    pub rotation: f64,
}

impl TagRelativePose {
    pub fn new(perpendicular: f64, parallel: f64, rotation: f64) -> Self {
        TagRelativePose {
            perpendicular,
            parallel,
            rotation,
        }
    }
}

impl PoseCandidate {
    pub fn new(translation: Vector3<f64>, rotation: Vector3<f64>, error: f64) -> Self {
        PoseCandidate {
            translation,
            rotation,
            error,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.error.is_finite()
            && self.translation.iter().all(|v| v.is_finite())
            && self.rotation.iter().all(|v| v.is_finite())
    }

    pub fn tag_relative(&self) -> TagRelativePose {
        let rot = Rotation3::new(self.rotation);
        let m = rot.matrix();
        TagRelativePose {
            perpendicular: self.translation.z,
            parallel: self.translation.x,
            rotation: m[(0, 2)].atan2(m[(2, 2)]),
        }
    }
}

/// A single marker found in one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TagDetection {
    pub id: TagId,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub hamming: u32,
    pub decision_margin: f64,
    /// Tag center in pixels.
    #[serde(default)]
    pub center: [f64; 2],
    #[serde(default)]
    pub corners: [[f64; 2]; 4],
    /// Ambiguous pose solutions, usually two.
    pub pose_candidates: Vec<PoseCandidate>,
}

impl TagDetection {
    /// Detections must be strictly above the threshold to be kept.
    pub fn passes_margin(&self, threshold: f64) -> bool {
        self.decision_margin > threshold
    }
}

/// Drop weak detections.
pub fn filter_by_margin(detections: &[TagDetection], threshold: f64) -> Vec<&TagDetection> {
    detections
        .iter()
        .filter(|det| {
            let keep = det.passes_margin(threshold);
            if !keep {
                log::debug!(
                    "dropping tag {} (decision margin {:.1} <= {:.1})",
                    det.id,
                    det.decision_margin,
                    threshold
                );
            }
            keep
        })
        .collect()
}

/// Tag center normalized to [-1, 1] across the frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetReport {
    pub id: TagId,
    pub x: f64,
    pub y: f64,
}

impl TargetReport {
    pub fn from_detection(det: &TagDetection, frame_width: u32, frame_height: u32) -> Self {
        let half_w = f64::from(frame_width) / 2.0;
        let half_h = f64::from(frame_height) / 2.0;
        TargetReport {
            id: det.id,
            x: (det.center[0] - half_w) / half_w,
            y: (det.center[1] - half_h) / half_h,
        }
    }
}
