//! Cell tessellations the world grid can be built on.
//!
//! A grid is addressed by integer [`GridCoord`]s. The tessellation itself is
//! a stateless [`CellGeometry`] chosen once when the map is created and shared
//! behind an `Arc`, so callers never branch on the grid kind.

use crate::errors::{RoadbedError, RoadbedResult};
use bevy::prelude::*;
use derive_more::{Add, Display, Sub};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

pub mod hex;
pub mod rect;

pub use hex::HexGeometry;
pub use rect::RectGeometry;

/// Integer cell coordinate (column, row)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Add, Sub, Display, Serialize, Deserialize,
)]
#[display("({x}, {y})")]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    /// Parent value meaning "no parent": the cell is a root of its tree.
    pub const ZERO: GridCoord = GridCoord { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

impl From<(i32, i32)> for GridCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Tessellation of the XZ plane into polygonal cells.
///
/// Corner `i` is shared by edges `i - 1` and `i`; edge `i` runs from corner `i`
/// to corner `i + 1`. World positions are `Vec2(x, z)`.
pub trait CellGeometry: std::fmt::Debug + Send + Sync {
    fn kind(&self) -> GeometryKind;

    fn corners_count(&self) -> usize;

    /// Cell owning the point
    fn point_to_hex(&self, point: Vec2) -> GridCoord;

    /// Index of the corner sector of `hex` the point falls in
    fn point_to_corner(&self, hex: GridCoord, point: Vec2) -> usize;

    /// Index of the edge of `hex` nearest to the point
    fn point_to_edge(&self, hex: GridCoord, point: Vec2) -> usize;

    fn center(&self, hex: GridCoord) -> Vec2;

    fn corner(&self, hex: GridCoord, i_corner: usize) -> Vec2;

    /// Cell across edge `i_edge`. Indices wrap around the corner count.
    fn neighbor(&self, hex: GridCoord, i_edge: usize) -> GridCoord;

    /// Geometric interpolation weights of the 3 (hex) or 4 (rect) cell centers
    /// around the point. Weights are non-negative and sum to 1.
    fn blend_weights(&self, point: Vec2) -> Vec<(GridCoord, f32)>;

    fn edge_center(&self, hex: GridCoord, i_edge: usize) -> Vec2 {
        let n = self.corners_count();
        (self.corner(hex, i_edge % n) + self.corner(hex, (i_edge + 1) % n)) / 2.0
    }

    fn opposite_edge(&self, i_edge: usize) -> usize {
        let n = self.corners_count();
        (i_edge + n / 2) % n
    }

    fn neighbors(&self, hex: GridCoord) -> Vec<GridCoord> {
        (0..self.corners_count())
            .map(|i| self.neighbor(hex, i))
            .collect()
    }
}

/// Which tessellation a map uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
pub enum GeometryKind {
    #[default]
    #[display("hex")]
    Hex,
    #[display("rect")]
    Rect,
}

impl GeometryKind {
    /// Build the shared geometry for this kind. `cell_radius` is the distance from
    /// a cell center to its corners (hex) or edges (rect).
    pub fn build(self, cell_radius: f32) -> Arc<dyn CellGeometry> {
        match self {
            GeometryKind::Hex => Arc::new(HexGeometry::new(cell_radius)),
            GeometryKind::Rect => Arc::new(RectGeometry::new(cell_radius * 2.0)),
        }
    }
}

impl FromStr for GeometryKind {
    type Err = RoadbedError;

    fn from_str(s: &str) -> RoadbedResult<Self> {
        match s.to_lowercase().as_str() {
            "hex" | "hexagon" => Ok(Self::Hex),
            "rect" | "rectangle" | "square" => Ok(Self::Rect),
            _ => Err(RoadbedError::InvalidMapData {
                reason: format!("Unknown grid geometry '{s}'. Available: hex, rect"),
            }),
        }
    }
}

/// Angle of `v` in degrees, in `[0, 360)`
pub(crate) fn angle_degrees(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees().rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometries() -> Vec<Arc<dyn CellGeometry>> {
        vec![GeometryKind::Hex.build(2.0), GeometryKind::Rect.build(2.0)]
    }

    #[test]
    fn test_neighbor_is_inverse_through_opposite_edge() {
        for geometry in geometries() {
            for y in -3..4 {
                for x in -3..4 {
                    let cell = GridCoord::new(x, y);
                    for i in 0..geometry.corners_count() {
                        let n = geometry.neighbor(cell, i);
                        assert_ne!(n, cell);
                        assert_eq!(
                            geometry.neighbor(n, geometry.opposite_edge(i)),
                            cell,
                            "{:?} edge {i} from {cell}",
                            geometry.kind()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_center_maps_back_to_cell() {
        for geometry in geometries() {
            for y in 0..6 {
                for x in 0..6 {
                    let cell = GridCoord::new(x, y);
                    assert_eq!(geometry.point_to_hex(geometry.center(cell)), cell);
                }
            }
        }
    }

    #[test]
    fn test_edge_center_lies_between_neighbors() {
        for geometry in geometries() {
            let cell = GridCoord::new(3, 3);
            for i in 0..geometry.corners_count() {
                let mid = geometry.edge_center(cell, i);
                let expected = (geometry.center(cell) + geometry.center(geometry.neighbor(cell, i))) / 2.0;
                assert!(
                    mid.distance(expected) < 1e-4,
                    "{:?} edge {i}: {mid} vs {expected}",
                    geometry.kind()
                );
                assert_eq!(geometry.point_to_edge(cell, mid), i);
            }
        }
    }

    #[test]
    fn test_point_near_corner_selects_that_corner() {
        for geometry in geometries() {
            let cell = GridCoord::new(2, 2);
            let center = geometry.center(cell);
            for i in 0..geometry.corners_count() {
                let p = center.lerp(geometry.corner(cell, i), 0.8);
                assert_eq!(geometry.point_to_hex(p), cell);
                assert_eq!(geometry.point_to_corner(cell, p), i);
            }
        }
    }

    #[test]
    fn test_blend_weights_sum_to_one_and_favor_own_cell() {
        for geometry in geometries() {
            let cell = GridCoord::new(3, 2);
            let center = geometry.center(cell);
            let weights = geometry.blend_weights(center);
            let sum: f32 = weights.iter().map(|(_, w)| w).sum();
            assert!((sum - 1.0).abs() < 1e-4);
            let own = weights.iter().find(|(c, _)| *c == cell).map(|(_, w)| *w);
            assert!(own.unwrap_or(0.0) > 0.99, "{:?}: {weights:?}", geometry.kind());

            let p = center.lerp(geometry.corner(cell, 1), 0.5);
            let weights = geometry.blend_weights(p);
            let sum: f32 = weights.iter().map(|(_, w)| w).sum();
            assert!((sum - 1.0).abs() < 1e-4);
            assert!(weights.iter().all(|(_, w)| *w >= 0.0));
        }
    }

    #[test]
    fn test_geometry_kind_parsing() {
        assert_eq!("hex".parse::<GeometryKind>().unwrap(), GeometryKind::Hex);
        assert_eq!("Rect".parse::<GeometryKind>().unwrap(), GeometryKind::Rect);
        assert!("triangle".parse::<GeometryKind>().is_err());
        assert_eq!(GeometryKind::Hex.build(1.0).corners_count(), 6);
        assert_eq!(GeometryKind::Rect.build(1.0).corners_count(), 4);
    }

    #[test]
    fn test_grid_coord_arithmetic() {
        let a = GridCoord::new(2, 3);
        let b = GridCoord::new(1, -1);
        assert_eq!(a + b, GridCoord::new(3, 2));
        assert_eq!(a - b, GridCoord::new(1, 4));
        assert!(GridCoord::ZERO.is_zero());
        assert_eq!(a.to_string(), "(2, 3)");
    }
}
