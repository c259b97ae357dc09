use crate::config::range_types::*;
use crate::roads::RoadFeatures;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Everything stored in `config.toml`
#[derive(Resource, Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct RoadbedConfig {
    pub preferences: BuildPreferences,
    pub roads: RoadSettings,
}

/// Global build preferences, passed explicitly to the passes that need them
#[derive(Resource, Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
// NOTE: When adding new fields, update the Default impl below
pub struct BuildPreferences {
    /// Wall-clock time a background build may take per frame
    pub max_build_duty_per_frame_ms: DutyMs,
    /// Heightmap rows processed between two elapsed-time checks
    pub rows_per_budget_check: RowBatch,
    pub log_features: LogFeatures,
}

impl Default for BuildPreferences {
    fn default() -> Self {
        Self {
            max_build_duty_per_frame_ms: DutyMs::new(0.5),
            rows_per_budget_check: RowBatch::new(10),
            log_features: LogFeatures::default(),
        }
    }
}

impl BuildPreferences {
    pub fn duty_per_frame(&self) -> Duration {
        Duration::from_secs_f64(self.max_build_duty_per_frame_ms.get() as f64 / 1000.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct LogFeatures {
    pub log_build_time: bool,
    pub log_seed: bool,
}

impl Default for LogFeatures {
    fn default() -> Self {
        Self {
            log_build_time: true,
            log_seed: true,
        }
    }
}

/// Road network and road bed settings
#[derive(Resource, Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct RoadSettings {
    /// Cell types roads are built between; `-Name` excludes a type
    pub target_cell_types: Vec<String>,
    pub road_radius: Meters,
    /// Extra radius of the taken area around the road, may be negative
    pub taken_area_padding: OffsetMeters,
    /// Multiplier of micro noise amplitude on road cells
    pub micro_noise_scale: UnitFraction,
    pub features: RoadFeatures,
    /// Height of lifted road cells above the water level
    pub height_above_water: OffsetMeters,

    // Road bed
    /// Elevation of the bed over the terrain surface, usually negative
    pub bed_offset_y: OffsetMeters,
    /// Side padding of the bed beyond the road radius
    pub bed_padding: Meters,
    pub bed_horizontality: UnitFraction,
}

impl Default for RoadSettings {
    fn default() -> Self {
        Self {
            target_cell_types: vec!["Ruins".to_string(), "Gate".to_string()],
            road_radius: Meters::new(0.7),
            taken_area_padding: OffsetMeters::new(0.0),
            micro_noise_scale: UnitFraction::new(0.1),
            features: RoadFeatures::default(),
            height_above_water: OffsetMeters::new(1.0),

            bed_offset_y: OffsetMeters::new(-0.3),
            bed_padding: Meters::new(1.5),
            bed_horizontality: UnitFraction::new(1.0),
        }
    }
}

impl RoadSettings {
    /// Radius of the taken areas emitted for road segments
    pub fn taken_radius(&self) -> f32 {
        self.road_radius.get() + self.taken_area_padding.get()
    }
}
