//! AprilTag field localization for the Prometheus robot.
//!
//! Detections of known field tags are turned into one robot pose per frame:
//! each tag pose is disambiguated, projected into the field frame through a
//! precomputed tag table, and the per-tag results are averaged.

pub mod capture;
pub mod common;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod perception;

pub use common::{Pose2D, TagId};
pub use config::Parameters;
pub use error::{LocalizerError, Result};
pub use perception::detection::{PoseCandidate, TagDetection, TagRelativePose};
pub use perception::field_layout::{FieldLayout, TagFieldPose, TagFieldTable};
pub use perception::localization::{field_pose, FrameEstimate, Localizer, RobotPoseEstimate};
pub use perception::{FrameReport, PerceptionStack};
