//! Perception module for the localizer
pub mod detection;
pub mod field_layout;
pub mod filters;
pub mod localization;
pub mod resolver;
pub mod sensors;

use self::detection::{TagDetection, TargetReport};
use self::localization::Localizer;
use crate::common::{Pose2D, TagId};
use crate::config::Parameters;
use crate::error::{LocalizerError, Result};
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};
use serde::Serialize;
use std::time::Instant;

/// Per-frame output handed to telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    /// Pose computed from this frame alone.
    pub pose: Option<Pose2D>,
    /// Most recent pose of any frame so far.
    pub last_pose: Option<Pose2D>,
    pub tags_used: Vec<TagId>,
    pub targets: Vec<TargetReport>,
    pub filtered: usize,
    pub skipped: usize,
    pub processing_secs: f64,
}

/// Perception stack for the robot
pub struct PerceptionStack {
    base: LifecycleNodeBase,
    params: Parameters,
    localizer: Option<Localizer>,
    last_pose: Option<Pose2D>,
    frames: u64,
}

impl PerceptionStack {
    /// Create a new perception stack
    pub fn new(params: Parameters) -> Self {
        PerceptionStack {
            base: LifecycleNodeBase::new("perception_stack"),
            params,
            localizer: None,
            last_pose: None,
            frames: 0,
        }
    }

    pub fn state(&self) -> State {
        self.base.get_state()
    }

    pub fn localizer(&self) -> Option<&Localizer> {
        self.localizer.as_ref()
    }

    /// Get the current pose estimate
    pub fn last_pose(&self) -> Option<Pose2D> {
        self.last_pose
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    /// Localize one frame. Frames without a usable tag keep the previous pose.
    pub fn process_frame(&mut self, detections: &[TagDetection]) -> Result<FrameReport> {
        let localizer = match (&self.localizer, self.base.get_state()) {
            (Some(localizer), State::Active) => localizer,
            _ => {
                return Err(LocalizerError::NotActive {
                    name: self.base.name.clone(),
                })
            }
        };

        let started = Instant::now();
        let cam = &self.params.camera;
        let accepted = localizer.accept(detections);
        let targets = accepted
            .iter()
            .map(|det| TargetReport::from_detection(det, cam.frame_width, cam.frame_height))
            .collect();
        let estimate = localizer.estimate_accepted(&accepted);

        if detections.is_empty() {
            log::debug!("frame {}: no AprilTags", self.frames);
        }
        if let Some(pose) = estimate.pose {
            self.last_pose = Some(pose);
        }

        let report = FrameReport {
            frame: self.frames,
            pose: estimate.pose,
            last_pose: self.last_pose,
            tags_used: estimate.estimates.iter().map(|e| e.tag_id).collect(),
            targets,
            filtered: detections.len() - accepted.len(),
            skipped: estimate.skipped,
            processing_secs: started.elapsed().as_secs_f64(),
        };
        self.frames += 1;
        Ok(report)
    }
}

impl LifecycleNode for PerceptionStack {
    fn on_configure(&mut self) -> Result<()> {
        self.params.validate()?;
        let localizer = Localizer::from_params(&self.params);
        log::info!(
            "configuring perception stack: {} tags, resolver={}, family={}",
            localizer.table().len(),
            localizer.resolver_name(),
            self.params.apriltag_detection.tag_family
        );
        self.localizer = Some(localizer);
        self.base.set_state(State::Inactive);
        Ok(())
    }

    fn on_activate(&mut self) -> Result<()> {
        if self.localizer.is_none() {
            return Err(LocalizerError::InvalidConfig(format!(
                "{} must be configured before activation",
                self.base.name
            )));
        }
        log::info!("activating perception stack");
        self.base.set_state(State::Active);
        Ok(())
    }

    fn on_deactivate(&mut self) -> Result<()> {
        log::info!("deactivating perception stack after {} frames", self.frames);
        self.base.set_state(State::Inactive);
        Ok(())
    }

    fn on_cleanup(&mut self) -> Result<()> {
        log::info!("cleaning up perception stack");
        self.localizer = None;
        self.last_pose = None;
        self.frames = 0;
        self.base.set_state(State::Unconfigured);
        Ok(())
    }
}
