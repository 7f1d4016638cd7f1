//! Parameter file for the localizer.
//!
//! Camera and detector parameters live in a JSON file next to the binary
//! (`parameters.json` by default). The `Camera` and `apriltag_detection`
//! sections are required; `post_process` and `field_layout` fall back to
//! their defaults when absent.

use crate::error::{LocalizerError, Result};
use crate::perception::field_layout::FieldLayout;
use crate::perception::filters::HeadingAveraging;
use crate::perception::resolver::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level parameter file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(rename = "Camera")]
    pub camera: CameraParams,
    pub apriltag_detection: AprilTagParams,
    #[serde(default)]
    pub post_process: PostProcessParams,
    #[serde(default)]
    pub field_layout: FieldLayout,
}

/// Capture settings and pinhole intrinsics of the camera.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraParams {
    pub frame_width: u32,
    pub frame_height: u32,
    pub fps: u32,
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraParams {
    /// Minimum time between two captured frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

/// Detector and pose estimator settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AprilTagParams {
    pub tag_family: String,
    /// Tag edge length in meters.
    pub tag_size: f64,
    /// Detections at or below this margin are dropped.
    pub detection_margin_threshold: f64,
    /// Orthogonal iteration count handed to the pose estimator.
    pub detection_iterations: u32,
}

/// Post-processing of the estimator output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostProcessParams {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub heading_averaging: HeadingAveraging,
    /// Stop after this many frames; `null` runs until the source is exhausted.
    #[serde(default = "default_max_frames")]
    pub max_frames: Option<u64>,
}

fn default_max_frames() -> Option<u64> {
    Some(500)
}

impl Default for PostProcessParams {
    fn default() -> Self {
        PostProcessParams {
            resolver: ResolverConfig::default(),
            heading_averaging: HeadingAveraging::default(),
            max_frames: default_max_frames(),
        }
    }
}

impl Parameters {
    /// Read, parse and validate a parameter file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse and validate parameters from a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let params: Parameters =
            serde_json::from_str(text).map_err(|source| LocalizerError::Json {
                line: source.line(),
                source,
            })?;
        params.validate()?;
        Ok(params)
    }

    /// Check the invariants the rest of the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        let cam = &self.camera;
        if cam.frame_width == 0 || cam.frame_height == 0 {
            return Err(LocalizerError::InvalidConfig(
                "frame size must be positive".to_string(),
            ));
        }
        if cam.fps == 0 {
            return Err(LocalizerError::InvalidConfig(
                "fps must be positive".to_string(),
            ));
        }
        if !(self.apriltag_detection.tag_size > 0.0) {
            return Err(LocalizerError::InvalidConfig(
                "tag_size must be positive".to_string(),
            ));
        }
        if !self.apriltag_detection.detection_margin_threshold.is_finite() {
            return Err(LocalizerError::InvalidConfig(
                "detection_margin_threshold must be finite".to_string(),
            ));
        }
        self.post_process.resolver.validate()?;
        self.field_layout.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "Camera": {"frame_width": 640, "frame_height": 480, "fps": 30,
                   "fx": 600.0, "fy": 600.0, "cx": 320.0, "cy": 240.0},
        "apriltag_detection": {"tag_family": "tag16h5", "tag_size": 0.1524,
                               "detection_margin_threshold": 35.0,
                               "detection_iterations": 50}
    }"#;

    #[test]
    fn optional_sections_use_defaults() {
        let params = Parameters::from_json_str(MINIMAL).unwrap();
        assert_eq!(params.post_process.max_frames, Some(500));
        assert_eq!(params.post_process.resolver, ResolverConfig::LowestError);
        assert_eq!(
            params.post_process.heading_averaging,
            HeadingAveraging::Linear
        );
        assert_eq!(params.field_layout.walls.len(), 4);
        assert_eq!(params.camera.frame_interval(), Duration::from_secs_f64(1.0 / 30.0));
    }

    #[test]
    fn zero_fps_is_rejected() {
        let text = MINIMAL.replace("\"fps\": 30", "\"fps\": 0");
        let err = Parameters::from_json_str(&text).unwrap_err();
        assert!(matches!(err, LocalizerError::InvalidConfig(_)), "{err}");
    }

    #[test]
    fn malformed_json_reports_line() {
        let err = Parameters::from_json_str("{\n\"Camera\": ,\n}").unwrap_err();
        match err {
            LocalizerError::Json { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
