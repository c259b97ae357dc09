//! Demo world generation: cell types, parent trees and cell heights for a map
//! the road builder can run on.

use crate::errors::RoadbedResult;
use crate::grid::{GeometryKind, GridCoord};
use crate::map::{assign_parents, CellType, Map};
use crate::resources::LogFeatures;
use bevy::prelude::*;
use noise::{NoiseFn, Perlin};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use std::sync::Arc;

// Keeps samples off the Perlin lattice, where the noise is always zero
const NOISE_OFFSET: f64 = 0.371;

/// The cell types a generated world uses
#[derive(Debug, Clone)]
pub struct CellPalette {
    pub border: Arc<CellType>,
    pub water: Arc<CellType>,
    pub field: Arc<CellType>,
    pub forest: Arc<CellType>,
    pub ruins: Arc<CellType>,
    pub gate: Arc<CellType>,
}

impl Default for CellPalette {
    fn default() -> Self {
        Self {
            border: CellType::new("Border", 1.0),
            water: CellType::new("Water", 2.0),
            field: CellType::new("Field", 1.0),
            forest: CellType::new("Forest", 1.0),
            ruins: CellType::new("Ruins", 1.5),
            gate: CellType::new("Gate", 1.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorldGenerationConfig {
    pub seed: u32,
    pub geometry: GeometryKind,
    /// Cells per side
    pub size: u32,
    pub cell_radius: f32,
    /// Height variation of the terrain
    pub amplitude: f32,
    /// Noise frequency per world unit
    pub frequency: f32,
    pub octaves: u32,
    /// Normalized noise below which a cell becomes water
    pub water_threshold: f32,
    pub water_level: f32,
    pub ruins_count: usize,
    pub gate_count: usize,
    pub log_features: LogFeatures,
}

impl Default for WorldGenerationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            geometry: GeometryKind::Hex,
            size: 24,
            cell_radius: 5.0,
            amplitude: 8.0,
            frequency: 0.02,
            octaves: 4,
            water_threshold: -0.35,
            water_level: -2.0,
            ruins_count: 5,
            gate_count: 2,
            log_features: LogFeatures::default(),
        }
    }
}

pub struct WorldGenerator {
    config: WorldGenerationConfig,
    palette: CellPalette,
}

impl WorldGenerator {
    pub fn new(config: WorldGenerationConfig) -> Self {
        Self {
            config,
            palette: CellPalette::default(),
        }
    }

    pub fn config(&self) -> &WorldGenerationConfig {
        &self.config
    }

    pub fn palette(&self) -> &CellPalette {
        &self.palette
    }

    /// Build the map: cell types, gates, ruins and parent pointers toward the gates
    pub fn generate_map(&self) -> RoadbedResult<Map> {
        let config = &self.config;
        if config.log_features.log_seed {
            info!("Generating world with seed {}", config.seed);
        }

        let geometry = config.geometry.build(config.cell_radius);
        let mut map = Map::new(config.size, geometry, self.palette.field.clone())?;
        map.water_level = config.water_level;

        let terrain = Perlin::new(config.seed);
        let vegetation = Perlin::new(config.seed.wrapping_add(1));
        let mut rng = Pcg64::seed_from_u64(config.seed as u64);

        let all: Vec<GridCoord> = map.all_hex().collect();
        for &hex in &all {
            let center = map.geometry().center(hex);
            let cell_type = if map.is_border_or_outside(hex) {
                &self.palette.border
            } else if self.fbm(&terrain, center) < config.water_threshold {
                &self.palette.water
            } else if self.fbm(&vegetation, center) > 0.25 {
                &self.palette.forest
            } else {
                &self.palette.field
            };
            if let Some(cell) = map.get_mut(hex) {
                cell.cell_type = cell_type.clone();
            }
        }

        let last = map.size() - 1;
        let mut gate_candidates: Vec<GridCoord> = all
            .iter()
            .copied()
            .filter(|hex| map.is_border_or_outside(*hex))
            .filter(|hex| !((hex.x == 0 || hex.x == last) && (hex.y == 0 || hex.y == last)))
            .collect();
        gate_candidates.shuffle(&mut rng);
        gate_candidates.truncate(config.gate_count);
        for &gate in &gate_candidates {
            if let Some(cell) = map.get_mut(gate) {
                cell.cell_type = self.palette.gate.clone();
            }
        }

        let mut ruins_candidates: Vec<GridCoord> = map
            .all_inside_hex()
            .filter(|hex| {
                map.get(*hex)
                    .is_some_and(|cell| !Arc::ptr_eq(&cell.cell_type, &self.palette.water))
            })
            .collect();
        ruins_candidates.shuffle(&mut rng);
        ruins_candidates.truncate(config.ruins_count);
        for &ruin in &ruins_candidates {
            if let Some(cell) = map.get_mut(ruin) {
                cell.cell_type = self.palette.ruins.clone();
            }
        }

        let water = self.palette.water.clone();
        let forest = self.palette.forest.clone();
        let assigned = assign_parents(&mut map, &gate_candidates, |map, _from, to| {
            let cell = map.get(to)?;
            if map.is_border_or_outside(to) || Arc::ptr_eq(&cell.cell_type, &water) {
                None
            } else if Arc::ptr_eq(&cell.cell_type, &forest) {
                Some(25)
            } else {
                Some(10)
            }
        });

        info!(
            "Map {}x{} ({}) created: {} gates, {} ruins, {} cells linked",
            config.size,
            config.size,
            config.geometry,
            gate_candidates.len(),
            ruins_candidates.len(),
            assigned
        );
        Ok(map)
    }

    /// Fill cell heights from noise; water cells sink below the water level
    pub fn generate_cell_heights(&self, map: &mut Map) {
        let config = &self.config;
        let terrain = Perlin::new(config.seed);
        let below_water = config.water_level - 1.0;

        for hex in map.all_hex().collect::<Vec<_>>() {
            let center = map.geometry().center(hex);
            let height = self.fbm(&terrain, center) * config.amplitude;
            if let Some(cell) = map.get_mut(hex) {
                cell.height = if Arc::ptr_eq(&cell.cell_type, &self.palette.water) {
                    height.min(below_water)
                } else {
                    height
                };
            }
        }
        debug!("Cell heights created for {} cells", map.cell_count());
    }

    /// Fractal noise normalized to roughly [-1, 1]
    fn fbm(&self, noise: &Perlin, point: Vec2) -> f32 {
        let frequency = self.config.frequency as f64;
        let x = point.x as f64 * frequency + NOISE_OFFSET;
        let y = point.y as f64 * frequency + NOISE_OFFSET;

        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut total = 0.0;
        let mut scale = 1.0;
        for _ in 0..self.config.octaves.max(1) {
            value += noise.get([x * scale, y * scale]) * amplitude;
            total += amplitude;
            amplitude *= 0.5; // Persistence
            scale *= 2.0; // Lacunarity
        }
        (value / total) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::RoadSettings;
    use crate::roads::RoadNetworkExtractor;

    fn dry_config(seed: u32, geometry: GeometryKind) -> WorldGenerationConfig {
        WorldGenerationConfig {
            seed,
            geometry,
            size: 16,
            water_threshold: -10.0,
            ..WorldGenerationConfig::default()
        }
    }

    fn cells_of(map: &Map, name: &str) -> Vec<GridCoord> {
        map.all_hex()
            .filter(|hex| map.get(*hex).is_some_and(|c| c.cell_type.name == name))
            .collect()
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = WorldGenerator::new(dry_config(7, GeometryKind::Hex));
        let a = generator.generate_map().unwrap();
        let b = generator.generate_map().unwrap();
        assert_eq!(cells_of(&a, "Ruins"), cells_of(&b, "Ruins"));
        assert_eq!(cells_of(&a, "Gate"), cells_of(&b, "Gate"));
        for hex in a.all_hex() {
            assert_eq!(a.parent(hex), b.parent(hex));
        }
    }

    #[test]
    fn test_gates_on_border_and_ruins_inside() {
        let generator = WorldGenerator::new(dry_config(3, GeometryKind::Rect));
        let map = generator.generate_map().unwrap();
        let gates = cells_of(&map, "Gate");
        let ruins = cells_of(&map, "Ruins");
        assert_eq!(gates.len(), 2);
        assert_eq!(ruins.len(), 5);
        assert!(gates.iter().all(|g| map.is_border_or_outside(*g)));
        assert!(ruins.iter().all(|r| !map.is_border_or_outside(*r)));
    }

    #[test]
    fn test_ruins_reach_a_gate() {
        for kind in [GeometryKind::Hex, GeometryKind::Rect] {
            let generator = WorldGenerator::new(dry_config(11, kind));
            let map = generator.generate_map().unwrap();
            let gates = cells_of(&map, "Gate");
            for ruin in cells_of(&map, "Ruins") {
                let root = map.parent_chain(ruin).last();
                assert!(root.is_some_and(|r| gates.contains(&r)), "{ruin} is not linked to a gate");
            }
        }
    }

    #[test]
    fn test_cell_heights_follow_amplitude() {
        let config = WorldGenerationConfig {
            water_threshold: 0.0,
            ..dry_config(5, GeometryKind::Hex)
        };
        let generator = WorldGenerator::new(config);
        let mut map = generator.generate_map().unwrap();
        generator.generate_cell_heights(&mut map);

        let heights: Vec<f32> = map.all_hex().map(|h| map.get(h).unwrap().height).collect();
        assert!(heights.iter().all(|h| h.abs() <= 8.0 + 1e-3 || *h <= map.water_level - 1.0));
        assert!(heights.iter().any(|h| (h - heights[0]).abs() > 1e-3));
        for hex in cells_of(&map, "Water") {
            assert!(map.get(hex).unwrap().height <= map.water_level - 1.0);
        }
    }

    #[test]
    fn test_generated_world_has_roads() {
        let generator = WorldGenerator::new(dry_config(42, GeometryKind::Hex));
        let mut map = generator.generate_map().unwrap();
        generator.generate_cell_heights(&mut map);
        let ruins = cells_of(&map, "Ruins");

        let network = RoadNetworkExtractor::new(RoadSettings::default()).extract(&mut map);
        assert_eq!(network.targets.len(), 7);
        assert!(!network.segments.is_empty());
        for ruin in ruins {
            assert!(network.road_cells.contains(&ruin));
        }
    }
}
