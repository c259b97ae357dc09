use crate::errors::{RoadbedError, RoadbedResult};
use crate::grid::{CellGeometry, GridCoord};
use crate::terrain::taken_area::TakenArea;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

pub mod cell_types;
pub mod parent_tree;

pub use cell_types::{CellType, CellTypeFilter};
pub use parent_tree::assign_parents;

/// Content flags of a cell, packed into one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellContent(u8);

impl CellContent {
    pub const NONE: CellContent = CellContent(0);
    pub const IS_ROAD: CellContent = CellContent(1 << 0);
    pub const IS_ROAD_CROSS: CellContent = CellContent(1 << 1);

    pub fn contains(self, flag: CellContent) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn set(&mut self, flag: CellContent, value: bool) {
        if value {
            self.0 |= flag.0;
        } else {
            self.0 &= !flag.0;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Edge {
    pub is_road: bool,
}

/// One tile of the world grid
#[derive(Debug, Clone)]
pub struct Cell {
    pub cell_type: Arc<CellType>,
    /// Next cell toward the nearest root; `GridCoord::ZERO` marks a root
    pub parent: GridCoord,
    /// One record per edge, indexed like the geometry's edges
    pub edges: Vec<Edge>,
    pub content: CellContent,
    pub height: f32,
    pub micro_noise_scale: f32,
    /// Ground claimed by features, appended during a build
    pub taken_areas: Vec<TakenArea>,
}

impl Cell {
    pub fn new(cell_type: Arc<CellType>, corners_count: usize) -> Self {
        Self {
            cell_type,
            parent: GridCoord::ZERO,
            edges: vec![Edge::default(); corners_count],
            content: CellContent::NONE,
            height: 0.0,
            micro_noise_scale: 1.0,
            taken_areas: Vec::new(),
        }
    }

    pub fn has_content(&self, flag: CellContent) -> bool {
        self.content.contains(flag)
    }

    pub fn set_content(&mut self, flag: CellContent, value: bool) {
        self.content.set(flag, value);
    }

    pub fn road_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_road).count()
    }
}

/// Square grid of `size * size` cells owned for one generation run.
///
/// Cells are stored densely, indexed by `y * size + x`. The outermost ring of
/// cells is the border; coordinates outside the grid are never failures, they
/// simply have no cell.
#[derive(Debug, Clone, Resource)]
pub struct Map {
    size: i32,
    geometry: Arc<dyn CellGeometry>,
    cells: Vec<Cell>,
    pub water_level: f32,
}

impl Map {
    pub const MIN_SIZE: u32 = 3;
    pub const MAX_SIZE: u32 = 4096;

    /// Create a map with every cell of type `fill`
    pub fn new(size: u32, geometry: Arc<dyn CellGeometry>, fill: Arc<CellType>) -> RoadbedResult<Self> {
        if !(Self::MIN_SIZE..=Self::MAX_SIZE).contains(&size) {
            return Err(RoadbedError::InvalidMapData {
                reason: format!(
                    "Map size {size} is outside [{}, {}]",
                    Self::MIN_SIZE,
                    Self::MAX_SIZE
                ),
            });
        }

        let corners = geometry.corners_count();
        let cells = (0..size * size)
            .map(|_| Cell::new(fill.clone(), corners))
            .collect();

        Ok(Self {
            size: size as i32,
            geometry,
            cells,
            water_level: 0.0,
        })
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn geometry(&self) -> &dyn CellGeometry {
        self.geometry.as_ref()
    }

    pub fn shared_geometry(&self) -> Arc<dyn CellGeometry> {
        self.geometry.clone()
    }

    /// Dense index of a coordinate, `None` outside the grid
    pub fn index(&self, hex: GridCoord) -> Option<usize> {
        self.contains(hex)
            .then(|| (hex.y * self.size + hex.x) as usize)
    }

    pub fn coord_of(&self, index: usize) -> GridCoord {
        let index = index as i32;
        GridCoord::new(index % self.size, index / self.size)
    }

    pub fn contains(&self, hex: GridCoord) -> bool {
        hex.x >= 0 && hex.y >= 0 && hex.x < self.size && hex.y < self.size
    }

    pub fn is_border_or_outside(&self, hex: GridCoord) -> bool {
        !self.contains(hex)
            || hex.x == 0
            || hex.y == 0
            || hex.x == self.size - 1
            || hex.y == self.size - 1
    }

    /// All cells, row by row
    pub fn all_hex(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.cells.len()).map(|i| self.coord_of(i))
    }

    /// All cells except the border ring
    pub fn all_inside_hex(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.all_hex().filter(|hex| !self.is_border_or_outside(*hex))
    }

    pub fn get(&self, hex: GridCoord) -> Option<&Cell> {
        self.index(hex).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, hex: GridCoord) -> Option<&mut Cell> {
        self.index(hex).map(|i| &mut self.cells[i])
    }

    /// Parent of a cell; `GridCoord::ZERO` for roots and for coordinates outside the grid
    pub fn parent(&self, hex: GridCoord) -> GridCoord {
        self.get(hex).map_or(GridCoord::ZERO, |cell| cell.parent)
    }

    /// Walk parent pointers from `start` toward its root.
    ///
    /// Yields the cells after `start`. The walk ends at the zero sentinel, at a
    /// coordinate outside the grid, or before revisiting a cell, so a
    /// self-parent or a cycle ends it after at most one lap.
    pub fn parent_chain(&self, start: GridCoord) -> ParentChain<'_> {
        ParentChain {
            map: self,
            visited: HashSet::from([start]),
            next: self.parent(start),
            hops_left: self.cells.len(),
        }
    }

    /// Cell center lifted to the cell height
    pub fn hex_to_pos(&self, hex: GridCoord) -> Vec3 {
        let center = self.geometry.center(hex);
        let height = self.get(hex).map_or(self.water_level, |cell| cell.height);
        Vec3::new(center.x, height, center.y)
    }

    /// Height on the shared edge between `hex` and its neighbor across `i_edge`,
    /// each side weighted by its type's height power
    pub fn edge_height(&self, hex: GridCoord, i_edge: usize) -> Option<f32> {
        let cell = self.get(hex)?;
        let other = self.get(self.geometry.neighbor(hex, i_edge))?;
        Some(blend_heights(cell, other))
    }

    /// The 3 (hex) or 4 (rect) cells around a point with normalized weights.
    ///
    /// Geometric weights are scaled by each cell type's height power. Cells
    /// outside the grid are dropped.
    pub fn weighted_cells(&self, point: Vec2) -> Vec<(GridCoord, f32)> {
        let mut weighted: Vec<(GridCoord, f32)> = self
            .geometry
            .blend_weights(point)
            .into_iter()
            .filter_map(|(hex, w)| {
                self.get(hex)
                    .map(|cell| (hex, w * cell.cell_type.height_power))
            })
            .collect();

        let sum: f32 = weighted.iter().map(|(_, w)| w).sum();
        if sum <= f32::EPSILON {
            let owner = self.geometry.point_to_hex(point);
            return if self.contains(owner) {
                vec![(owner, 1.0)]
            } else {
                Vec::new()
            };
        }

        for (_, w) in &mut weighted {
            *w /= sum;
        }
        weighted
    }

    /// Terrain height at a world point, blended from the surrounding cells
    pub fn height_at(&self, point: Vec2) -> Option<f32> {
        let weighted = self.weighted_cells(point);
        if weighted.is_empty() {
            return None;
        }
        Some(
            weighted
                .iter()
                .filter_map(|(hex, w)| self.get(*hex).map(|cell| cell.height * w))
                .sum(),
        )
    }

    /// World-space extent covered by the grid, measured from the origin
    pub fn world_extent(&self) -> Vec2 {
        let last = self.size - 1;
        let reach = (0..self.geometry.corners_count())
            .map(|i| self.geometry.corner(GridCoord::ZERO, i) - self.geometry.center(GridCoord::ZERO))
            .fold(Vec2::ZERO, |acc, d| acc.max(d.abs()));
        let far = self
            .geometry
            .center(GridCoord::new(last, last))
            .max(self.geometry.center(GridCoord::new(last, (last - 1).max(0))));
        far + reach
    }
}

/// Height of the edge between two cells weighted by their height powers
pub fn blend_heights(a: &Cell, b: &Cell) -> f32 {
    let wa = a.cell_type.height_power;
    let wb = b.cell_type.height_power;
    if wa + wb <= f32::EPSILON {
        return (a.height + b.height) / 2.0;
    }
    (a.height * wa + b.height * wb) / (wa + wb)
}

/// Iterator over a parent chain, see [`Map::parent_chain`]
pub struct ParentChain<'a> {
    map: &'a Map,
    visited: HashSet<GridCoord>,
    next: GridCoord,
    // backstop only, the visited set ends every cycle first
    hops_left: usize,
}

impl Iterator for ParentChain<'_> {
    type Item = GridCoord;

    fn next(&mut self) -> Option<GridCoord> {
        if self.next.is_zero() || self.hops_left == 0 || !self.map.contains(self.next) {
            return None;
        }
        if !self.visited.insert(self.next) {
            return None;
        }
        self.hops_left -= 1;
        let current = self.next;
        self.next = self.map.parent(current);
        Some(current)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::grid::GeometryKind;

    #[test]
    fn test_map_creation() {
        let map = flat_map(GeometryKind::Hex, 5);
        assert_eq!(map.size(), 5);
        assert_eq!(map.cell_count(), 25);
        assert_eq!(map.all_inside_hex().count(), 9);
        assert_eq!(map.get(GridCoord::new(2, 2)).unwrap().edges.len(), 6);
    }

    #[test]
    fn test_map_invalid_size() {
        let geometry = GeometryKind::Rect.build(1.0);
        assert!(Map::new(2, geometry, CellType::new("Field", 1.0)).is_err());
    }

    #[test]
    fn test_outside_coordinates_have_no_cell() {
        let map = flat_map(GeometryKind::Rect, 4);
        assert!(map.get(GridCoord::new(-1, 0)).is_none());
        assert!(map.get(GridCoord::new(4, 1)).is_none());
        assert!(map.is_border_or_outside(GridCoord::new(9, 9)));
        assert!(map.is_border_or_outside(GridCoord::new(0, 2)));
        assert!(!map.is_border_or_outside(GridCoord::new(1, 2)));
        assert_eq!(map.parent(GridCoord::new(-3, -3)), GridCoord::ZERO);
    }

    #[test]
    fn test_index_round_trips() {
        let map = flat_map(GeometryKind::Hex, 6);
        for hex in map.all_hex() {
            assert_eq!(map.coord_of(map.index(hex).unwrap()), hex);
        }
    }

    #[test]
    fn test_content_flags() {
        let mut content = CellContent::NONE;
        content.set(CellContent::IS_ROAD, true);
        assert!(content.contains(CellContent::IS_ROAD));
        assert!(!content.contains(CellContent::IS_ROAD_CROSS));
        content.set(CellContent::IS_ROAD_CROSS, true);
        content.set(CellContent::IS_ROAD, false);
        assert!(!content.contains(CellContent::IS_ROAD));
        assert!(content.contains(CellContent::IS_ROAD_CROSS));
    }

    #[test]
    fn test_parent_chain_follows_links() {
        let mut map = flat_map(GeometryKind::Rect, 6);
        link_chain(&mut map, &[(1, 1), (2, 1), (3, 1), (3, 2)]);
        let chain: Vec<GridCoord> = map.parent_chain(GridCoord::new(1, 1)).collect();
        assert_eq!(
            chain,
            vec![GridCoord::new(2, 1), GridCoord::new(3, 1), GridCoord::new(3, 2)]
        );
    }

    #[test]
    fn test_parent_chain_stops_on_self_parent() {
        let mut map = flat_map(GeometryKind::Rect, 6);
        link_chain(&mut map, &[(1, 1), (2, 2)]);
        map.get_mut(GridCoord::new(2, 2)).unwrap().parent = GridCoord::new(2, 2);
        let chain: Vec<GridCoord> = map.parent_chain(GridCoord::new(1, 1)).collect();
        assert_eq!(chain, vec![GridCoord::new(2, 2)]);
    }

    #[test]
    fn test_parent_chain_stops_within_diameter_on_cycle() {
        let mut map = flat_map(GeometryKind::Rect, 64);
        link_chain(&mut map, &[(2, 2), (3, 2), (3, 3)]);
        map.get_mut(GridCoord::new(3, 3)).unwrap().parent = GridCoord::new(2, 2);

        let chain: Vec<GridCoord> = map.parent_chain(GridCoord::new(2, 2)).collect();
        assert!(chain.len() <= 2 * map.size() as usize, "walk took {} hops", chain.len());
        assert_eq!(chain, vec![GridCoord::new(3, 2), GridCoord::new(3, 3)]);

        // entering the cycle from outside still ends after one lap
        map.get_mut(GridCoord::new(10, 10)).unwrap().parent = GridCoord::new(3, 2);
        assert_eq!(map.parent_chain(GridCoord::new(10, 10)).count(), 3);
    }

    #[test]
    fn test_edge_height_uses_height_power() {
        let mut map = flat_map(GeometryKind::Rect, 5);
        let heavy = CellType::new("Rock", 3.0);
        set_type(&mut map, (2, 3), &heavy);
        map.get_mut(GridCoord::new(2, 2)).unwrap().height = 0.0;
        map.get_mut(GridCoord::new(2, 3)).unwrap().height = 4.0;
        // edge 0 of a rect cell is the top edge
        let h = map.edge_height(GridCoord::new(2, 2), 0).unwrap();
        assert!((h - 3.0).abs() < 1e-6);
        assert!(map.edge_height(GridCoord::new(2, 4), 0).is_none());
    }

    #[test]
    fn test_height_at_cell_center_is_cell_height() {
        for kind in [GeometryKind::Hex, GeometryKind::Rect] {
            let mut map = flat_map(kind, 6);
            for hex in map.all_hex().collect::<Vec<_>>() {
                map.get_mut(hex).unwrap().height = hex.x as f32 + 10.0 * hex.y as f32;
            }
            let hex = GridCoord::new(3, 2);
            let center = map.geometry().center(hex);
            let h = map.height_at(center).unwrap();
            assert!((h - 23.0).abs() < 1e-3, "{kind:?}: {h}");
        }
    }

    #[test]
    fn test_weighted_cells_are_normalized() {
        let map = flat_map(GeometryKind::Hex, 6);
        let hex = GridCoord::new(2, 3);
        let p = map.geometry().center(hex).lerp(map.geometry().corner(hex, 4), 0.6);
        let weighted = map.weighted_cells(p);
        assert_eq!(weighted.len(), 3);
        let sum: f32 = weighted.iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_world_extent_covers_last_cell() {
        let map = flat_map(GeometryKind::Rect, 4);
        let extent = map.world_extent();
        let last = map.geometry().center(GridCoord::new(3, 3));
        assert!(extent.x >= last.x && extent.y >= last.y);
    }
}
