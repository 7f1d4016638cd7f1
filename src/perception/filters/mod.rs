//! Filtering algorithms for per-tag pose estimates

use crate::common::Pose2D;
use serde::{Deserialize, Serialize};

/// A generic filter interface
pub trait Filter<T> {
    /// Combine the inputs of one frame; `None` when there is nothing to combine
    fn filter(&self, inputs: &[T]) -> Option<T>;
}

/// How headings are combined across tags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingAveraging {
    /// Plain scalar mean. Wrong near the +/-pi seam.
    #[default]
    Linear,
    /// Mean of unit vectors.
    Circular,
}

/// Unweighted mean of the per-tag robot poses of one frame
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseAverager {
    heading: HeadingAveraging,
}

impl PoseAverager {
    pub fn new(heading: HeadingAveraging) -> Self {
        PoseAverager { heading }
    }
}

/// Running mean; exact when every sample is equal.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut m = 0.0;
    for (k, v) in values.enumerate() {
        if k == 0 {
            m = v;
        } else {
            m += (v - m) / (k + 1) as f64;
        }
    }
    m
}

impl Filter<Pose2D> for PoseAverager {
    fn filter(&self, inputs: &[Pose2D]) -> Option<Pose2D> {
        if inputs.is_empty() {
            return None;
        }

        let x = mean(inputs.iter().map(|p| p.x));
        let y = mean(inputs.iter().map(|p| p.y));
        let heading = match self.heading {
            HeadingAveraging::Linear => mean(inputs.iter().map(|p| p.heading)),
            HeadingAveraging::Circular => {
                let s = mean(inputs.iter().map(|p| p.heading.sin()));
                let c = mean(inputs.iter().map(|p| p.heading.cos()));
                s.atan2(c)
            }
        };

        Some(Pose2D::new(x, y, heading))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn empty_frame_has_no_estimate() {
        assert_eq!(PoseAverager::default().filter(&[]), None);
        assert_eq!(PoseAverager::new(HeadingAveraging::Circular).filter(&[]), None);
    }

    #[test]
    fn identical_inputs_return_that_pose_exactly() {
        let pose = Pose2D::new(0.1, 2.7, -1.3);
        for n in 1..=7 {
            let inputs = vec![pose; n];
            assert_eq!(PoseAverager::default().filter(&inputs), Some(pose));
        }
    }

    #[test]
    fn two_tag_mean() {
        let avg = PoseAverager::default()
            .filter(&[Pose2D::new(3.0, 0.5, 0.1), Pose2D::new(3.2, 0.7, 0.15)])
            .unwrap();
        assert_relative_eq!(avg.x, 3.1, epsilon = 1e-12);
        assert_relative_eq!(avg.y, 0.6, epsilon = 1e-12);
        assert_relative_eq!(avg.heading, 0.125, epsilon = 1e-12);
    }

    #[test]
    fn linear_mean_breaks_at_the_seam_and_circular_does_not() {
        let inputs = [
            Pose2D::new(0.0, 0.0, PI - 0.1),
            Pose2D::new(0.0, 0.0, -PI + 0.1),
        ];
        let linear = PoseAverager::new(HeadingAveraging::Linear).filter(&inputs).unwrap();
        assert_relative_eq!(linear.heading, 0.0, epsilon = 1e-12);

        let circular = PoseAverager::new(HeadingAveraging::Circular)
            .filter(&inputs)
            .unwrap();
        assert_relative_eq!(circular.heading.abs(), PI, epsilon = 1e-9);
    }
}
