//! Pose ambiguity resolution
//!
//! A planar tag seen at an angle gives the estimator two valid poses. The
//! resolvers here pick one of them, or reject the tag outright. Picking the
//! lower reprojection error is the baseline; it ignores temporal consistency.

use super::detection::{PoseCandidate, TagDetection};
use crate::error::{LocalizerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for ambiguity resolution strategies
pub trait AmbiguityResolver: Debug + Send + Sync {
    /// Pick the candidate to localize from
    fn resolve<'a>(&self, detection: &'a TagDetection) -> Result<&'a PoseCandidate>;

    /// Get the name of this strategy
    fn name(&self) -> &str;
}

/// Resolver selection in the parameter file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ResolverConfig {
    #[default]
    LowestError,
    AmbiguityRatio {
        /// Largest accepted `best_error / runner_up_error`, in (0, 1].
        max_ratio: f64,
    },
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<()> {
        match *self {
            ResolverConfig::LowestError => Ok(()),
            ResolverConfig::AmbiguityRatio { max_ratio } => {
                if max_ratio > 0.0 && max_ratio <= 1.0 {
                    Ok(())
                } else {
                    Err(LocalizerError::InvalidConfig(format!(
                        "max_ratio must be in (0, 1], got {max_ratio}"
                    )))
                }
            }
        }
    }

    pub fn build(&self) -> Box<dyn AmbiguityResolver> {
        match *self {
            ResolverConfig::LowestError => Box::new(LowestErrorResolver),
            ResolverConfig::AmbiguityRatio { max_ratio } => {
                Box::new(AmbiguityRatioResolver::new(max_ratio))
            }
        }
    }
}

/// Best candidate and the error of the runner-up, if any.
fn rank(detection: &TagDetection) -> Result<(&PoseCandidate, Option<f64>)> {
    let degenerate = |reason| LocalizerError::DegenerateCandidates {
        id: detection.id,
        reason,
    };

    let candidates = &detection.pose_candidates;
    if candidates.is_empty() {
        return Err(degenerate("no pose candidates"));
    }
    if candidates.iter().any(|c| c.error.is_nan()) {
        return Err(degenerate("NaN reprojection error"));
    }

    // strict comparison keeps the first candidate on ties
    let mut best = 0;
    for (i, cand) in candidates.iter().enumerate().skip(1) {
        if cand.error < candidates[best].error {
            best = i;
        }
    }
    let runner_up = candidates
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != best)
        .map(|(_, c)| c.error)
        .fold(None, |acc: Option<f64>, e| Some(acc.map_or(e, |a| a.min(e))));

    // an infinite error on a losing candidate just loses
    let chosen = &candidates[best];
    if !chosen.is_finite() {
        return Err(degenerate("non-finite pose"));
    }
    Ok((chosen, runner_up))
}

/// Picks the candidate with the smaller reprojection error.
#[derive(Debug, Default, Clone, Copy)]
pub struct LowestErrorResolver;

impl AmbiguityResolver for LowestErrorResolver {
    fn resolve<'a>(&self, detection: &'a TagDetection) -> Result<&'a PoseCandidate> {
        rank(detection).map(|(best, _)| best)
    }

    fn name(&self) -> &str {
        "lowest_error"
    }
}

/// Lowest error, but rejects tags whose two solutions are too close to call.
#[derive(Debug, Clone, Copy)]
pub struct AmbiguityRatioResolver {
    max_ratio: f64,
}

impl AmbiguityRatioResolver {
    pub fn new(max_ratio: f64) -> Self {
        AmbiguityRatioResolver { max_ratio }
    }
}

impl AmbiguityResolver for AmbiguityRatioResolver {
    fn resolve<'a>(&self, detection: &'a TagDetection) -> Result<&'a PoseCandidate> {
        let (best, runner_up) = rank(detection)?;
        let ratio = match runner_up {
            None => 0.0,
            Some(other) if other > 0.0 => best.error / other,
            // both errors zero
            Some(_) => 1.0,
        };
        if ratio > self.max_ratio {
            return Err(LocalizerError::AmbiguousPose {
                id: detection.id,
                ratio,
                max_ratio: self.max_ratio,
            });
        }
        Ok(best)
    }

    fn name(&self) -> &str {
        "ambiguity_ratio"
    }
}
