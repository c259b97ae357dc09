use crate::errors::{RoadbedError, RoadbedResult};
use crate::map::Map;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

pub mod bed_shaper;
pub mod taken_area;

pub use bed_shaper::{BedParams, BedShapingJob, ShapingProgress, ShapingStats, SliceBudget};
pub use taken_area::{nearest_point, NearestMatch, TakenArea, TakenAreaType};

/// Terrain heightmap. Sample `(i, j)` sits at world `(i, j) * scale`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Resource)]
pub struct HeightMap {
    #[validate(range(min = 3, max = 8192))]
    pub width: u32,
    #[validate(range(min = 3, max = 8192))]
    pub height: u32,
    pub heights: Vec<f32>, // Flattened 2D array (row-major), world units
    #[validate(range(min = 0.01, max = 100.0))]
    pub scale: f32, // World units per sample
}

impl HeightMap {
    /// Create a new heightmap with validation
    pub fn new(width: u32, height: u32, heights: Vec<f32>, scale: f32) -> RoadbedResult<Self> {
        let expected_size = (width as usize) * (height as usize);
        if heights.len() != expected_size {
            return Err(RoadbedError::InvalidHeightMap {
                reason: format!(
                    "Heights array size {} does not match dimensions {width}x{height} (expected {expected_size})",
                    heights.len()
                ),
            });
        }

        let heightmap = Self {
            width,
            height,
            heights,
            scale,
        };
        heightmap.validate()?;
        Ok(heightmap)
    }

    pub fn create_flat(width: u32, height: u32, scale: f32, base_height: f32) -> RoadbedResult<Self> {
        let heights = vec![base_height; (width as usize) * (height as usize)];
        Self::new(width, height, heights, scale)
    }

    /// Sample the map's blended cell heights over its whole world extent
    pub fn from_map(map: &Map, scale: f32) -> RoadbedResult<Self> {
        if scale <= 0.0 {
            return Err(RoadbedError::InvalidHeightMap {
                reason: format!("Sample spacing must be positive, got {scale}"),
            });
        }
        let extent = map.world_extent();
        let width = (extent.x / scale).ceil() as u32 + 1;
        let height = (extent.y / scale).ceil() as u32 + 1;

        let mut heights = Vec::with_capacity((width as usize) * (height as usize));
        for j in 0..height {
            for i in 0..width {
                let p = Vec2::new(i as f32, j as f32) * scale;
                heights.push(map.height_at(p).unwrap_or(map.water_level));
            }
        }

        info!("Sampled {width}x{height} heightmap at {scale} m spacing");
        Self::new(width, height, heights, scale)
    }

    pub fn index(&self, i: u32, j: u32) -> usize {
        j as usize * self.width as usize + i as usize
    }

    /// Height at exact sample position (no interpolation)
    pub fn get(&self, i: u32, j: u32) -> Option<f32> {
        if i >= self.width || j >= self.height {
            return None;
        }
        self.heights.get(self.index(i, j)).copied()
    }

    pub fn sample_to_world(&self, i: u32, j: u32) -> Vec2 {
        Vec2::new(i as f32, j as f32) * self.scale
    }

    /// Nearest sample to a world point, clamped into the heightmap
    pub fn world_to_sample(&self, point: Vec2) -> (u32, u32) {
        let i = (point.x / self.scale).round().clamp(0.0, (self.width - 1) as f32);
        let j = (point.y / self.scale).round().clamp(0.0, (self.height - 1) as f32);
        (i as u32, j as u32)
    }

    /// Save the heightmap with bincode
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> RoadbedResult<()> {
        self.validate()?;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(|e| {
            RoadbedError::InvalidHeightMap {
                reason: format!("Failed to serialize heightmap: {e}"),
            }
        })?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> RoadbedResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RoadbedError::HeightMapFileNotFound {
                path: path.to_path_buf(),
            });
        }

        let data = std::fs::read(path)?;
        let (heightmap, _): (HeightMap, usize) =
            bincode::serde::decode_from_slice(&data, bincode::config::standard()).map_err(|e| {
                RoadbedError::CorruptedHeightMapFile {
                    reason: format!("Failed to deserialize heightmap: {e}"),
                }
            })?;
        Self::new(heightmap.width, heightmap.height, heightmap.heights, heightmap.scale)
    }
}
