//! Localization module
//!
//! Turns the tags seen in one frame into a field-frame robot pose. Each tag
//! is looked up in the field table, disambiguated, projected into the field
//! frame and the per-tag results are averaged. Tags that cannot be used are
//! skipped; they never abort the frame.

use super::detection::{filter_by_margin, TagDetection, TagRelativePose};
use super::field_layout::{TagFieldPose, TagFieldTable};
use super::filters::{Filter, PoseAverager};
use super::resolver::AmbiguityResolver;
use crate::common::{Pose2D, TagId};
use crate::config::Parameters;
use crate::error::{LocalizerError, Result};
use serde::Serialize;

/// Project a tag-relative pose into the field frame.
pub fn field_pose(rel: &TagRelativePose, tag: &TagFieldPose) -> Pose2D {
    let (sin, cos) = tag.heading.sin_cos();
    Pose2D {
        x: tag.x + rel.perpendicular * cos + rel.parallel * sin,
        y: tag.y + rel.perpendicular * sin + rel.parallel * cos,
        heading: rel.rotation - tag.heading,
    }
}

/// Robot pose implied by a single tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RobotPoseEstimate {
    pub tag_id: TagId,
    pub pose: Pose2D,
}

/// Outcome of localizing one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameEstimate {
    /// Averaged pose; `None` when no tag was usable.
    pub pose: Option<Pose2D>,
    pub estimates: Vec<RobotPoseEstimate>,
    /// Tags dropped by the decision-margin filter.
    pub filtered: usize,
    /// Tags rejected during lookup or disambiguation.
    pub skipped: usize,
}

/// A localizer for the robot
#[derive(Debug)]
pub struct Localizer {
    table: TagFieldTable,
    resolver: Box<dyn AmbiguityResolver>,
    averager: PoseAverager,
    margin_threshold: f64,
}

impl Localizer {
    /// Create a new localizer
    pub fn new(
        table: TagFieldTable,
        resolver: Box<dyn AmbiguityResolver>,
        averager: PoseAverager,
        margin_threshold: f64,
    ) -> Self {
        Localizer {
            table,
            resolver,
            averager,
            margin_threshold,
        }
    }

    /// Build from validated parameters
    pub fn from_params(params: &Parameters) -> Self {
        Localizer::new(
            TagFieldTable::build(&params.field_layout),
            params.post_process.resolver.build(),
            PoseAverager::new(params.post_process.heading_averaging),
            params.apriltag_detection.detection_margin_threshold,
        )
    }

    pub fn table(&self) -> &TagFieldTable {
        &self.table
    }

    pub fn resolver_name(&self) -> &str {
        self.resolver.name()
    }

    /// Detections strong enough to localize from.
    pub fn accept<'a>(&self, detections: &'a [TagDetection]) -> Vec<&'a TagDetection> {
        filter_by_margin(detections, self.margin_threshold)
    }

    /// Robot pose implied by one detection.
    pub fn estimate_tag(&self, detection: &TagDetection) -> Result<RobotPoseEstimate> {
        let tag = self.table.get(detection.id)?;
        let candidate = self.resolver.resolve(detection)?;
        let pose = field_pose(&candidate.tag_relative(), tag);
        if !pose.is_finite() {
            return Err(LocalizerError::DegenerateCandidates {
                id: detection.id,
                reason: "non-finite field pose",
            });
        }
        Ok(RobotPoseEstimate {
            tag_id: detection.id,
            pose,
        })
    }

    /// Localize from detections that already passed [`Localizer::accept`].
    pub fn estimate_accepted(&self, accepted: &[&TagDetection]) -> FrameEstimate {
        let mut estimates = Vec::with_capacity(accepted.len());
        let mut skipped = 0;
        for det in accepted {
            match self.estimate_tag(det) {
                Ok(est) => estimates.push(est),
                Err(e) => {
                    log::warn!("skipping tag {}: {}", det.id, e);
                    skipped += 1;
                }
            }
        }

        let poses: Vec<Pose2D> = estimates.iter().map(|e| e.pose).collect();
        FrameEstimate {
            pose: self.averager.filter(&poses),
            estimates,
            filtered: 0,
            skipped,
        }
    }

    /// Localize one frame.
    pub fn estimate(&self, detections: &[TagDetection]) -> FrameEstimate {
        let accepted = self.accept(detections);
        let mut frame = self.estimate_accepted(&accepted);
        frame.filtered = detections.len() - accepted.len();
        frame
    }
}
