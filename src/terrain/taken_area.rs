//! Ground claimed by features: capsule-shaped segments stored per cell.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Feature that claimed a piece of ground
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TakenAreaType {
    Road,
    River,
    Building,
}

/// A directed segment with a radius, in world XZ coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TakenArea {
    pub from: Vec2,
    pub to: Vec2,
    pub radius: f32,
    pub area_type: TakenAreaType,
}

/// Closest point found by [`nearest_point`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestMatch {
    pub point: Vec2,
    /// Squared distance from the query point to the capsule surface
    pub dist_sq: f32,
}

impl TakenArea {
    pub fn new(from: Vec2, to: Vec2, radius: f32, area_type: TakenAreaType) -> Self {
        Self {
            from,
            to,
            radius,
            area_type,
        }
    }

    /// Closest point on the segment (clamped to its ends) and the squared
    /// distance to it. Zero-length segments have no closest point.
    pub fn closest_point(&self, point: Vec2) -> Option<(Vec2, f32)> {
        let dir = self.to - self.from;
        let len_sq = dir.length_squared();
        if len_sq <= f32::EPSILON {
            return None;
        }
        let t = ((point - self.from).dot(dir) / len_sq).clamp(0.0, 1.0);
        let closest = self.from + dir * t;
        Some((closest, closest.distance_squared(point)))
    }

    /// Whether the point lies inside the capsule
    pub fn contains(&self, point: Vec2) -> bool {
        self.closest_point(point)
            .is_some_and(|(_, dist_sq)| dist_sq <= self.radius * self.radius)
    }

    pub fn length(&self) -> f32 {
        self.from.distance(self.to)
    }
}

/// Nearest point over a set of areas.
///
/// Distances are measured to a capsule of `radius` around each centerline, so
/// points within `radius` of a segment report `dist_sq == 0`. Returns `None`
/// when no area (or only degenerate ones) is given.
pub fn nearest_point<'a, I>(areas: I, point: Vec2, radius: f32) -> Option<NearestMatch>
where
    I: IntoIterator<Item = &'a TakenArea>,
{
    areas
        .into_iter()
        .filter_map(|area| area.closest_point(point))
        .map(|(closest, center_dist_sq)| {
            let outside = (center_dist_sq.sqrt() - radius).max(0.0);
            NearestMatch {
                point: closest,
                dist_sq: outside * outside,
            }
        })
        .min_by(|a, b| a.dist_sq.total_cmp(&b.dist_sq))
}

/// [`nearest_point`] restricted to one area type
pub fn nearest_of_type<'a, I>(
    areas: I,
    area_type: TakenAreaType,
    point: Vec2,
    radius: f32,
) -> Option<NearestMatch>
where
    I: IntoIterator<Item = &'a TakenArea>,
{
    nearest_point(
        areas.into_iter().filter(|area| area.area_type == area_type),
        point,
        radius,
    )
}
