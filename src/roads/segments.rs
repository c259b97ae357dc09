//! Road centerline synthesis from tagged cells

use crate::grid::GridCoord;
use crate::map::{CellContent, Map};
use crate::terrain::taken_area::{TakenArea, TakenAreaType};
use bevy::prelude::*;

/// A piece of road centerline. Endpoints carry their height in `y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSegment {
    pub from: Vec3,
    pub to: Vec3,
}

impl PathSegment {
    pub fn new(from: Vec3, to: Vec3) -> Self {
        Self { from, to }
    }

    /// Ground footprint of the segment
    pub fn taken_area(&self, radius: f32) -> TakenArea {
        TakenArea::new(
            Vec2::new(self.from.x, self.from.z),
            Vec2::new(self.to.x, self.to.z),
            radius,
            TakenAreaType::Road,
        )
    }
}

/// Centerline of one road cell.
///
/// A crossing gets a star of segments from each road edge midpoint to the
/// cell center. A cell with exactly two road edges gets an elbow of three
/// segments through points halfway between each edge midpoint and the center.
/// Anything else gets nothing.
pub fn cell_segments(map: &Map, hex: GridCoord) -> Vec<PathSegment> {
    let Some(cell) = map.get(hex) else {
        return Vec::new();
    };
    if !cell.has_content(CellContent::IS_ROAD) {
        return Vec::new();
    }

    let geometry = map.geometry();
    let center = map.hex_to_pos(hex);
    let ends: Vec<Vec3> = cell
        .edges
        .iter()
        .enumerate()
        .filter(|(_, edge)| edge.is_road)
        .filter_map(|(i_edge, _)| {
            let height = map.edge_height(hex, i_edge)?;
            let mid = geometry.edge_center(hex, i_edge);
            Some(Vec3::new(mid.x, height, mid.y))
        })
        .collect();

    if cell.has_content(CellContent::IS_ROAD_CROSS) {
        return ends.iter().map(|&end| PathSegment::new(end, center)).collect();
    }

    match ends.as_slice() {
        [p0, p1] => {
            let half0 = ((*p0 + center) / 2.0).with_y(center.y);
            let half1 = ((*p1 + center) / 2.0).with_y(center.y);
            vec![
                PathSegment::new(*p0, half0),
                PathSegment::new(half0, half1),
                PathSegment::new(half1, *p1),
            ]
        }
        _ => Vec::new(),
    }
}

/// Build segments for every interior road cell and append their taken areas
/// to the owning cells
pub fn synthesize_segments(map: &mut Map, radius: f32) -> Vec<PathSegment> {
    let road_cells: Vec<GridCoord> = map
        .all_inside_hex()
        .filter(|hex| {
            map.get(*hex)
                .is_some_and(|cell| cell.has_content(CellContent::IS_ROAD))
        })
        .collect();

    let mut all = Vec::new();
    for hex in road_cells {
        let segments = cell_segments(map, hex);
        if let Some(cell) = map.get_mut(hex) {
            cell.taken_areas
                .extend(segments.iter().map(|segment| segment.taken_area(radius)));
        }
        all.extend(segments);
    }
    all
}
