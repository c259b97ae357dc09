//! Axis-aligned square cells. Cell `(x, y)` is centered at `(x, y) * size`.

use super::{CellGeometry, GeometryKind, GridCoord};
use bevy::prelude::*;

/// Corner directions in edge order: top-left, top-right, bottom-right, bottom-left
pub(crate) const CORNER_OFFSETS: [(i32, i32); 4] = [(-1, 1), (1, 1), (1, -1), (-1, -1)];
/// Neighbor offsets per edge: top, right, bottom, left
const EDGE_OFFSETS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectGeometry {
    size: f32,
}

impl RectGeometry {
    pub fn new(size: f32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> f32 {
        self.size
    }
}

impl CellGeometry for RectGeometry {
    fn kind(&self) -> GeometryKind {
        GeometryKind::Rect
    }

    fn corners_count(&self) -> usize {
        4
    }

    fn point_to_hex(&self, point: Vec2) -> GridCoord {
        GridCoord::new(
            (point.x / self.size).round() as i32,
            (point.y / self.size).round() as i32,
        )
    }

    fn point_to_corner(&self, hex: GridCoord, point: Vec2) -> usize {
        let d = point - self.center(hex);
        match (d.x < 0.0, d.y < 0.0) {
            (true, false) => 0,
            (false, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    fn point_to_edge(&self, hex: GridCoord, point: Vec2) -> usize {
        let d = point - self.center(hex);
        if d.x.abs() > d.y.abs() {
            if d.x > 0.0 { 1 } else { 3 }
        } else if d.y >= 0.0 {
            0
        } else {
            2
        }
    }

    fn blend_weights(&self, point: Vec2) -> Vec<(GridCoord, f32)> {
        let hex = self.point_to_hex(point);
        let (ox, oy) = CORNER_OFFSETS[self.point_to_corner(hex, point)];
        let n1 = hex + GridCoord::new(ox, 0);
        let n2 = hex + GridCoord::new(ox, oy);
        let n3 = hex + GridCoord::new(0, oy);

        // bilinear weights inside the quad spanned by the four centers
        let d = point - self.center(hex);
        let tx = (d.x.abs() / self.size).clamp(0.0, 1.0);
        let ty = (d.y.abs() / self.size).clamp(0.0, 1.0);
        vec![
            (hex, (1.0 - tx) * (1.0 - ty)),
            (n1, tx * (1.0 - ty)),
            (n2, tx * ty),
            (n3, (1.0 - tx) * ty),
        ]
    }

    fn center(&self, hex: GridCoord) -> Vec2 {
        Vec2::new(hex.x as f32, hex.y as f32) * self.size
    }

    fn corner(&self, hex: GridCoord, i_corner: usize) -> Vec2 {
        let (dx, dy) = CORNER_OFFSETS[i_corner % 4];
        self.center(hex) + Vec2::new(dx as f32, dy as f32) * (self.size / 2.0)
    }

    fn neighbor(&self, hex: GridCoord, i_edge: usize) -> GridCoord {
        let (dx, dy) = EDGE_OFFSETS[i_edge % 4];
        hex + GridCoord::new(dx, dy)
    }
}
