//! Road network extraction.
//!
//! Roads follow the parent pointers of the map from every target cell toward
//! its root. Where walks from different targets meet, the meeting cell is a
//! junction. Cells between targets, junctions and roots become road cells,
//! their tree edges are tagged, and centerline segments are emitted.

use crate::build_phase::BuildPhase;
use crate::grid::GridCoord;
use crate::map::{CellContent, CellTypeFilter, Map};
use crate::resources::RoadSettings;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;
use std::time::Instant;

pub mod segments;

pub use segments::{cell_segments, synthesize_segments, PathSegment};

/// Optional behaviors of the road builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoadFeatures(u16);

impl RoadFeatures {
    pub const NONE: RoadFeatures = RoadFeatures(0);
    pub const LIFT_ROADS_TO_WATER_LEVEL: RoadFeatures = RoadFeatures(1 << 0);
    pub const LIFT_CROSSES_TO_WATER_LEVEL: RoadFeatures = RoadFeatures(1 << 1);
    pub const SPAWN_ROADS_IN_TARGET_CELLS: RoadFeatures = RoadFeatures(1 << 2);
    pub const MAKE_MESH: RoadFeatures = RoadFeatures(1 << 6);
    pub const MAKE_COLLIDER: RoadFeatures = RoadFeatures(1 << 7);
    pub const SMOOTH_ENDS: RoadFeatures = RoadFeatures(1 << 8);

    pub fn contains(self, flag: RoadFeatures) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn with(self, flag: RoadFeatures, value: bool) -> Self {
        if value {
            Self(self.0 | flag.0)
        } else {
            Self(self.0 & !flag.0)
        }
    }

    pub fn bits(self) -> u16 {
        self.0
    }
}

impl Default for RoadFeatures {
    fn default() -> Self {
        Self::LIFT_ROADS_TO_WATER_LEVEL | Self::MAKE_MESH | Self::MAKE_COLLIDER
    }
}

impl BitOr for RoadFeatures {
    type Output = RoadFeatures;

    fn bitor(self, rhs: RoadFeatures) -> RoadFeatures {
        RoadFeatures(self.0 | rhs.0)
    }
}

/// Dense membership set over the cells of one map, iterated in insertion order
#[derive(Debug, Clone)]
pub struct CellSet {
    size: i32,
    flags: Vec<bool>,
    members: Vec<GridCoord>,
}

impl CellSet {
    pub fn new(map: &Map) -> Self {
        Self {
            size: map.size(),
            flags: vec![false; map.cell_count()],
            members: Vec::new(),
        }
    }

    fn index(&self, hex: GridCoord) -> Option<usize> {
        (hex.x >= 0 && hex.y >= 0 && hex.x < self.size && hex.y < self.size)
            .then(|| (hex.y * self.size + hex.x) as usize)
    }

    /// Returns false when the cell was already present or lies outside the map
    pub fn insert(&mut self, hex: GridCoord) -> bool {
        let Some(i) = self.index(hex) else {
            return false;
        };
        if self.flags[i] {
            return false;
        }
        self.flags[i] = true;
        self.members.push(hex);
        true
    }

    pub fn contains(&self, hex: GridCoord) -> bool {
        self.index(hex).is_some_and(|i| self.flags[i])
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.members.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<GridCoord> {
        self.members.clone()
    }
}

impl Extend<GridCoord> for CellSet {
    fn extend<T: IntoIterator<Item = GridCoord>>(&mut self, iter: T) {
        for hex in iter {
            self.insert(hex);
        }
    }
}

/// Result of one extraction run
#[derive(Debug, Clone, Default, Resource)]
pub struct RoadNetwork {
    pub targets: Vec<GridCoord>,
    pub junctions: Vec<GridCoord>,
    pub road_cells: Vec<GridCoord>,
    pub crosses: Vec<GridCoord>,
    pub segments: Vec<PathSegment>,
}

pub struct RoadNetworkExtractor {
    settings: RoadSettings,
    filter: CellTypeFilter,
}

impl RoadNetworkExtractor {
    pub fn new(settings: RoadSettings) -> Self {
        let filter = CellTypeFilter::new(&settings.target_cell_types);
        Self { settings, filter }
    }

    pub fn settings(&self) -> &RoadSettings {
        &self.settings
    }

    /// Run extraction when the cell heights are ready, ignore other phases
    pub fn on_phase_completed(&self, phase: BuildPhase, map: &mut Map) -> Option<RoadNetwork> {
        (phase == BuildPhase::CellHeightsCreated).then(|| self.extract(map))
    }

    /// Tag road edges and cells, and append road taken areas to the map
    pub fn extract(&self, map: &mut Map) -> RoadNetwork {
        let started = Instant::now();

        let targets = self.find_targets(map);
        let junctions = find_junctions(map, &targets);
        let road_cells = find_road_cells(map, &targets, &junctions);
        let walked = started.elapsed();

        self.tag_edges(map, &targets, &road_cells);
        self.flag_road_cells(map, &road_cells);
        let crosses = self.flag_crosses(map, &junctions);
        let tagged = started.elapsed();

        let segments = synthesize_segments(map, self.settings.taken_radius());

        info!(
            "Road network: {} targets, {} junctions, {} road cells, {} crosses, {} segments",
            targets.len(),
            junctions.len(),
            road_cells.len(),
            crosses.len(),
            segments.len()
        );
        debug!(
            "Road extraction timings: walks {:?}, tagging {:?}, segments {:?}",
            walked,
            tagged - walked,
            started.elapsed() - tagged
        );

        RoadNetwork {
            targets: targets.to_vec(),
            junctions: junctions.to_vec(),
            road_cells: road_cells.to_vec(),
            crosses,
            segments,
        }
    }

    /// Cells of a target type. Border cells qualify too, gates live there.
    pub fn find_targets(&self, map: &Map) -> CellSet {
        let mut targets = CellSet::new(map);
        targets.extend(map.all_hex().filter(|hex| {
            map.get(*hex)
                .is_some_and(|cell| self.filter.matches(&cell.cell_type.name))
        }));
        targets
    }

    fn tag_edges(&self, map: &mut Map, targets: &CellSet, road_cells: &CellSet) {
        let in_targets = self
            .settings
            .features
            .contains(RoadFeatures::SPAWN_ROADS_IN_TARGET_CELLS);
        let geometry = map.shared_geometry();

        for hex in road_cells.iter() {
            if targets.contains(hex) && !in_targets {
                continue;
            }
            let parent = map.parent(hex);
            let tagged: Vec<usize> = (0..geometry.corners_count())
                .filter(|&i_edge| {
                    let n = geometry.neighbor(hex, i_edge);
                    // the zero sentinel means root, never a link to cell (0, 0)
                    (road_cells.contains(n) || targets.contains(n))
                        && ((!hex.is_zero() && map.parent(n) == hex)
                            || (!parent.is_zero() && parent == n))
                })
                .collect();

            if let Some(cell) = map.get_mut(hex) {
                for i_edge in tagged {
                    cell.edges[i_edge].is_road = true;
                }
            }
        }
    }

    fn flag_road_cells(&self, map: &mut Map, road_cells: &CellSet) {
        let lift = self
            .settings
            .features
            .contains(RoadFeatures::LIFT_ROADS_TO_WATER_LEVEL);
        let min_height = map.water_level + self.settings.height_above_water.get();

        for hex in road_cells.iter() {
            let Some(cell) = map.get_mut(hex) else {
                continue;
            };
            let is_road = cell.road_edge_count() >= 1;
            cell.set_content(CellContent::IS_ROAD, is_road);
            if is_road {
                if lift {
                    cell.height = cell.height.max(min_height);
                }
                cell.micro_noise_scale *= self.settings.micro_noise_scale.get();
            }
        }
    }

    /// Junctions with three or more road edges; two edges are just a bend
    fn flag_crosses(&self, map: &mut Map, junctions: &CellSet) -> Vec<GridCoord> {
        let lift = self
            .settings
            .features
            .contains(RoadFeatures::LIFT_CROSSES_TO_WATER_LEVEL);
        let min_height = map.water_level + self.settings.height_above_water.get();

        let mut crosses = Vec::new();
        for hex in junctions.iter() {
            let Some(cell) = map.get_mut(hex) else {
                continue;
            };
            let is_cross = cell.road_edge_count() >= 3;
            cell.set_content(CellContent::IS_ROAD_CROSS, is_cross);
            if is_cross {
                if lift {
                    cell.height = cell.height.max(min_height);
                }
                crosses.push(hex);
            }
        }
        crosses
    }
}

/// Cells where parent walks from different targets meet.
///
/// Each visited cell remembers the cell it was entered from. A walk stops at
/// the first cell already entered; if it was entered from elsewhere, that cell
/// is a junction.
pub fn find_junctions(map: &Map, targets: &CellSet) -> CellSet {
    let mut entered_from: Vec<Option<GridCoord>> = vec![None; map.cell_count()];
    for target in targets.iter() {
        if let Some(i) = map.index(target) {
            entered_from[i] = Some(target);
        }
    }

    let mut junctions = CellSet::new(map);
    for target in targets.iter() {
        let mut prev = target;
        for next in map.parent_chain(target) {
            let Some(i) = map.index(next) else {
                break;
            };
            if let Some(from) = entered_from[i] {
                if from != prev {
                    junctions.insert(next);
                }
                break;
            }
            entered_from[i] = Some(prev);
            prev = next;
        }
    }
    junctions
}

/// Junctions plus every cell on a target's chain that lies before a junction
/// or the end of the chain
pub fn find_road_cells(map: &Map, targets: &CellSet, junctions: &CellSet) -> CellSet {
    let mut road_cells = CellSet::new(map);
    road_cells.extend(junctions.iter());

    let mut pending = Vec::new();
    for target in targets.iter() {
        pending.clear();
        pending.push(target);
        for next in map.parent_chain(target) {
            if junctions.contains(next) {
                road_cells.extend(pending.drain(..));
            }
            pending.push(next);
        }
        road_cells.extend(pending.drain(..));
    }
    road_cells
}
