//! Pointy-top hexagons in "odd-r" offset coordinates: odd rows are shifted
//! half a cell to the right. Row index grows along +Z.

use super::{angle_degrees, CellGeometry, GeometryKind, GridCoord};
use bevy::prelude::*;

const SQRT_3: f32 = 1.732_050_8;

/// Neighbor offsets per edge for even rows: NE, NW, W, SW, SE, E
const EVEN_ROW_OFFSETS: [(i32, i32); 6] = [(0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, 0)];
/// Neighbor offsets per edge for odd rows: NE, NW, W, SW, SE, E
const ODD_ROW_OFFSETS: [(i32, i32); 6] = [(1, 1), (0, 1), (-1, 0), (0, -1), (1, -1), (1, 0)];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexGeometry {
    /// Center to corner distance
    radius: f32,
}

impl HexGeometry {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    fn width(&self) -> f32 {
        SQRT_3 * self.radius
    }

    fn row_parity(row: i32) -> i32 {
        row.rem_euclid(2)
    }
}

impl CellGeometry for HexGeometry {
    fn kind(&self) -> GeometryKind {
        GeometryKind::Hex
    }

    fn corners_count(&self) -> usize {
        6
    }

    fn point_to_hex(&self, point: Vec2) -> GridCoord {
        // fractional axial coordinates, then cube rounding
        let q = (SQRT_3 / 3.0 * point.x - point.y / 3.0) / self.radius;
        let r = (2.0 / 3.0 * point.y) / self.radius;
        let s = -q - r;

        let mut rq = q.round();
        let mut rr = r.round();
        let rs = s.round();

        let dq = (rq - q).abs();
        let dr = (rr - r).abs();
        let ds = (rs - s).abs();

        if dq > dr && dq > ds {
            rq = -rr - rs;
        } else if dr > ds {
            rr = -rq - rs;
        }

        let (q, r) = (rq as i32, rr as i32);
        GridCoord::new(q + (r - Self::row_parity(r)) / 2, r)
    }

    fn point_to_corner(&self, hex: GridCoord, point: Vec2) -> usize {
        let angle = angle_degrees(point - self.center(hex));
        (((angle - 30.0) / 60.0).round() as i32).rem_euclid(6) as usize
    }

    fn point_to_edge(&self, hex: GridCoord, point: Vec2) -> usize {
        let angle = angle_degrees(point - self.center(hex));
        (((angle - 60.0) / 60.0).round() as i32).rem_euclid(6) as usize
    }

    fn center(&self, hex: GridCoord) -> Vec2 {
        let shift = Self::row_parity(hex.y) as f32 * 0.5;
        Vec2::new(
            self.width() * (hex.x as f32 + shift),
            1.5 * self.radius * hex.y as f32,
        )
    }

    fn corner(&self, hex: GridCoord, i_corner: usize) -> Vec2 {
        let angle = (30.0 + 60.0 * (i_corner % 6) as f32).to_radians();
        self.center(hex) + Vec2::new(angle.cos(), angle.sin()) * self.radius
    }

    fn blend_weights(&self, point: Vec2) -> Vec<(GridCoord, f32)> {
        let hex = self.point_to_hex(point);
        let i_corner = self.point_to_corner(hex, point);
        let n1 = self.neighbor(hex, (i_corner + 5) % 6);
        let n2 = self.neighbor(hex, i_corner);

        let [w0, w1, w2] = barycentric(point, self.center(hex), self.center(n1), self.center(n2));
        let (w0, w1, w2) = (w0.abs(), w1.abs(), w2.abs());
        let sum = w0 + w1 + w2;
        if sum <= f32::EPSILON {
            return vec![(hex, 1.0)];
        }
        vec![(hex, w0 / sum), (n1, w1 / sum), (n2, w2 / sum)]
    }

    fn neighbor(&self, hex: GridCoord, i_edge: usize) -> GridCoord {
        let offsets = if Self::row_parity(hex.y) == 0 {
            &EVEN_ROW_OFFSETS
        } else {
            &ODD_ROW_OFFSETS
        };
        let (dx, dy) = offsets[i_edge % 6];
        hex + GridCoord::new(dx, dy)
    }
}

/// Barycentric coordinates of `p` in triangle `(a, b, c)`
fn barycentric(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> [f32; 3] {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() <= f32::EPSILON {
        return [1.0, 0.0, 0.0];
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    [1.0 - v - w, v, w]
}
