use crate::map::{CellContent, Map};
use bevy::prelude::*;

/// Debug view of the extracted roads: road edges as lines, road cells as
/// spheres (magenta for crossings)
pub struct RoadGizmoPlugin;

impl Plugin for RoadGizmoPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RoadGizmoSettings>().add_systems(
            Update,
            draw_road_gizmos.run_if(resource_exists::<Map>),
        );
    }
}

#[derive(Resource, Debug, Clone)]
pub struct RoadGizmoSettings {
    pub enabled: bool,
    /// Height of the gizmos over the cell surface
    pub lift: f32,
    pub marker_radius: f32,
}

impl Default for RoadGizmoSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            lift: 1.0,
            marker_radius: 1.0,
        }
    }
}

/// Line from each interior cell center to the midpoint toward every road neighbor
pub fn road_edge_lines(map: &Map, lift: f32) -> Vec<(Vec3, Vec3)> {
    let geometry = map.geometry();
    let mut lines = Vec::new();
    for hex in map.all_inside_hex() {
        let Some(cell) = map.get(hex) else {
            continue;
        };
        let center = map.hex_to_pos(hex) + Vec3::Y * lift;
        for (i_edge, edge) in cell.edges.iter().enumerate() {
            if !edge.is_road {
                continue;
            }
            let neighbor = map.hex_to_pos(geometry.neighbor(hex, i_edge)) + Vec3::Y * lift;
            lines.push((center, (center + neighbor) / 2.0));
        }
    }
    lines
}

fn draw_road_gizmos(mut gizmos: Gizmos, map: Res<Map>, settings: Res<RoadGizmoSettings>) {
    if !settings.enabled {
        return;
    }

    let road_color = Color::srgb(0.0, 1.0, 0.0);
    let cross_color = Color::srgb(1.0, 0.0, 1.0);

    for (from, to) in road_edge_lines(&map, settings.lift) {
        gizmos.line(from, to, road_color);
    }

    for hex in map.all_hex() {
        let Some(cell) = map.get(hex) else {
            continue;
        };
        let color = if cell.has_content(CellContent::IS_ROAD_CROSS) {
            cross_color
        } else if cell.has_content(CellContent::IS_ROAD) {
            road_color
        } else {
            continue;
        };
        let position = map.hex_to_pos(hex) + Vec3::Y * settings.lift;
        gizmos.sphere(
            Isometry3d::from_translation(position),
            settings.marker_radius,
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GeometryKind, GridCoord};
    use crate::map::test_support::flat_map;

    #[test]
    fn test_lines_stop_halfway_to_neighbor() {
        let mut map = flat_map(GeometryKind::Rect, 5);
        map.get_mut(GridCoord::new(2, 2)).unwrap().edges[1].is_road = true;
        map.get_mut(GridCoord::new(0, 2)).unwrap().edges[1].is_road = true;

        let lines = road_edge_lines(&map, 1.0);
        assert_eq!(lines.len(), 1);
        let (from, to) = lines[0];
        assert_eq!(from, Vec3::new(4.0, 1.0, 4.0));
        assert_eq!(to, Vec3::new(5.0, 1.0, 4.0));
    }
}
