//! Known tag poses on the field.
//!
//! Tags are mounted on the field walls. Identifiers run consecutively from 1,
//! wall by wall: with four tags per wall, tags 1-4 sit on the first wall,
//! 5-8 on the second and so on. Each wall gives its tags one heading and a
//! position that advances by `spacing` along the wall direction.

use crate::common::TagId;
use crate::error::{LocalizerError, Result};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, PI};

/// One field wall carrying a run of tags.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallSpec {
    /// Heading shared by every tag on this wall, radians.
    pub heading: f64,
    /// Wall start point in the field frame. The first tag sits one spacing
    /// away from it.
    pub origin: [f64; 2],
    /// Direction in which tag positions increase. Normalized on use.
    pub direction: [f64; 2],
}

/// Wall-assignment rule for the tag table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldLayout {
    #[serde(default = "default_tags_per_wall")]
    pub tags_per_wall: u32,
    /// Distance between neighbouring tags, meters.
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    #[serde(default = "default_walls")]
    pub walls: Vec<WallSpec>,
}

fn default_tags_per_wall() -> u32 {
    4
}

fn default_spacing() -> f64 {
    1.0
}

fn default_walls() -> Vec<WallSpec> {
    vec![
        WallSpec {
            heading: 0.0,
            origin: [0.0, 0.0],
            direction: [1.0, 0.0],
        },
        WallSpec {
            heading: FRAC_PI_2,
            origin: [5.0, 0.0],
            direction: [0.0, 1.0],
        },
        WallSpec {
            heading: PI,
            origin: [5.0, 5.0],
            direction: [-1.0, 0.0],
        },
        WallSpec {
            heading: -FRAC_PI_2,
            origin: [0.0, 5.0],
            direction: [0.0, -1.0],
        },
    ]
}

impl Default for FieldLayout {
    fn default() -> Self {
        FieldLayout {
            tags_per_wall: default_tags_per_wall(),
            spacing: default_spacing(),
            walls: default_walls(),
        }
    }
}

/// Upper bound on the number of tags a layout may describe.
pub const MAX_TAGS: u32 = 4096;

impl FieldLayout {
    pub fn validate(&self) -> Result<()> {
        if self.walls.is_empty() || self.tags_per_wall == 0 {
            return Err(LocalizerError::InvalidConfig(
                "field layout has no tags".to_string(),
            ));
        }
        let tag_count = u32::try_from(self.walls.len())
            .ok()
            .and_then(|walls| walls.checked_mul(self.tags_per_wall));
        if !tag_count.is_some_and(|n| n <= MAX_TAGS) {
            return Err(LocalizerError::InvalidConfig(format!(
                "field layout describes more than {MAX_TAGS} tags"
            )));
        }
        if !(self.spacing > 0.0) || !self.spacing.is_finite() {
            return Err(LocalizerError::InvalidConfig(format!(
                "tag spacing must be positive, got {}",
                self.spacing
            )));
        }
        for (i, wall) in self.walls.iter().enumerate() {
            let dir = Vector2::from(wall.direction);
            let finite = wall.heading.is_finite()
                && wall.origin.iter().all(|v| v.is_finite())
                && dir.iter().all(|v| v.is_finite());
            if !finite || dir.norm() == 0.0 {
                return Err(LocalizerError::InvalidConfig(format!(
                    "wall {i} needs a finite heading, origin and non-zero direction"
                )));
            }
        }
        Ok(())
    }
}

/// Absolute pose of one tag on the field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TagFieldPose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub wall: usize,
}

/// Read-only lookup from tag id to its field pose.
#[derive(Clone, Debug)]
pub struct TagFieldTable {
    poses: BTreeMap<TagId, TagFieldPose>,
}

impl TagFieldTable {
    /// Build the table from a validated layout.
    pub fn build(layout: &FieldLayout) -> Self {
        let mut poses = BTreeMap::new();
        let mut id: TagId = 1;
        for (wall_idx, wall) in layout.walls.iter().enumerate() {
            let origin = Vector2::from(wall.origin);
            let step = Vector2::from(wall.direction).normalize() * layout.spacing;
            for slot in 0..layout.tags_per_wall {
                let pos = origin + step * f64::from(slot + 1);
                poses.insert(
                    id,
                    TagFieldPose {
                        x: pos.x,
                        y: pos.y,
                        heading: wall.heading,
                        wall: wall_idx,
                    },
                );
                id += 1;
            }
        }
        log::debug!("built field table with {} tags", poses.len());
        TagFieldTable { poses }
    }

    pub fn get(&self, id: TagId) -> Result<&TagFieldPose> {
        self.poses.get(&id).ok_or(LocalizerError::UnknownTag(id))
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (TagId, &TagFieldPose)> {
        self.poses.iter().map(|(id, pose)| (*id, pose))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_layout_covers_ids_1_to_16() {
        let table = TagFieldTable::build(&FieldLayout::default());
        let ids: Vec<TagId> = table.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, (1..=16).collect::<Vec<_>>());
        assert!(table.get(0).is_err());
        assert!(matches!(table.get(17), Err(LocalizerError::UnknownTag(17))));
    }

    #[test]
    fn tag_one_sits_one_spacing_along_first_wall() {
        let table = TagFieldTable::build(&FieldLayout::default());
        let tag = table.get(1).unwrap();
        assert_relative_eq!(tag.x, 1.0);
        assert_relative_eq!(tag.y, 0.0);
        assert_relative_eq!(tag.heading, 0.0);
    }

    #[test]
    fn walls_are_evenly_spaced_with_constant_heading() {
        let layout = FieldLayout::default();
        let table = TagFieldTable::build(&layout);
        for (wall_idx, wall) in layout.walls.iter().enumerate() {
            let origin = Vector2::from(wall.origin);
            let tags: Vec<&TagFieldPose> = table
                .iter()
                .filter(|(_, p)| p.wall == wall_idx)
                .map(|(_, p)| p)
                .collect();
            assert_eq!(tags.len(), 4);

            let mut prev = 0.0;
            for tag in &tags {
                assert_eq!(tag.heading, wall.heading);
                let along = (Vector2::new(tag.x, tag.y) - origin).norm();
                assert_relative_eq!(along - prev, layout.spacing, epsilon = 1e-12);
                prev = along;
            }
        }
    }

    #[test]
    fn wall_assignment_follows_id_ranges() {
        let table = TagFieldTable::build(&FieldLayout::default());
        let wall = |id| table.get(id).unwrap().wall;
        assert_eq!(wall(1), 0);
        assert_eq!(wall(4), 0);
        assert_eq!(wall(5), 1);
        assert_eq!(wall(8), 1);
        assert_eq!(wall(9), 2);
        assert_eq!(wall(12), 2);
        assert_eq!(wall(13), 3);
        assert_eq!(wall(16), 3);
    }

    #[test]
    fn validate_caps_tag_count() {
        let layout = FieldLayout {
            tags_per_wall: u32::MAX,
            ..FieldLayout::default()
        };
        assert!(matches!(layout.validate(), Err(LocalizerError::InvalidConfig(_))));

        let layout = FieldLayout {
            tags_per_wall: MAX_TAGS / 4,
            ..FieldLayout::default()
        };
        layout.validate().unwrap();

        let layout = FieldLayout {
            tags_per_wall: MAX_TAGS / 4 + 1,
            ..FieldLayout::default()
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn validate_rejects_degenerate_walls() {
        let mut layout = FieldLayout::default();
        layout.walls[2].direction = [0.0, 0.0];
        assert!(layout.validate().is_err());

        let mut layout = FieldLayout::default();
        layout.spacing = 0.0;
        assert!(layout.validate().is_err());

        let layout = FieldLayout {
            walls: Vec::new(),
            ..FieldLayout::default()
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn custom_spacing_and_direction_are_applied() {
        let layout = FieldLayout {
            tags_per_wall: 2,
            spacing: 0.5,
            walls: vec![WallSpec {
                heading: 0.3,
                origin: [2.0, 1.0],
                direction: [0.0, 2.0],
            }],
        };
        layout.validate().unwrap();
        let table = TagFieldTable::build(&layout);
        assert_eq!(table.len(), 2);
        let tag = table.get(2).unwrap();
        assert_relative_eq!(tag.x, 2.0);
        assert_relative_eq!(tag.y, 2.0);
        assert_relative_eq!(tag.heading, 0.3);
    }
}
