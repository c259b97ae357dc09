use crate::build_phase::{BedShaped, BuildPhase, BuildPhaseCompleted};
use crate::map::Map;
use crate::resources::{BuildPreferences, RoadSettings};
use crate::roads::RoadNetworkExtractor;
use crate::terrain::{BedParams, BedShapingJob, HeightMap, SliceBudget};
use bevy::prelude::*;

/// Extracts the road network when cell heights exist and shapes the road bed
/// once the terrain heightmap exists, a slice per frame.
pub struct RoadNetworkPlugin;

impl Plugin for RoadNetworkPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<BuildPhaseCompleted>()
            .add_event::<BedShaped>()
            .init_resource::<RoadSettings>()
            .init_resource::<BuildPreferences>()
            .add_systems(Update, (react_to_build_phases, tick_bed_shaping).chain());
    }
}

/// Steps `app` until the pending road bed pass is done and returns the
/// number of frames it took. Every tick shapes at least one batch of rows, so
/// a pass of any size finishes, only over more frames.
pub fn run_until_bed_shaped(app: &mut App) -> u32 {
    let mut frames = 0;
    while app.world().contains_resource::<BedShapingJob>() {
        app.update();
        frames += 1;
    }
    frames
}

fn react_to_build_phases(
    mut commands: Commands,
    mut phases: EventReader<BuildPhaseCompleted>,
    settings: Res<RoadSettings>,
    map: Option<ResMut<Map>>,
    heightmap: Option<Res<HeightMap>>,
) {
    let Some(mut map) = map else {
        for BuildPhaseCompleted(phase) in phases.read() {
            warn!("Build phase {phase} raised without a map, roads skipped");
        }
        return;
    };

    for BuildPhaseCompleted(phase) in phases.read() {
        match phase {
            BuildPhase::CellHeightsCreated => {
                let extractor = RoadNetworkExtractor::new(settings.clone());
                if let Some(network) = extractor.on_phase_completed(*phase, &mut map) {
                    commands.insert_resource(network);
                }
            }
            BuildPhase::TerrainHeightMapCreated => {
                let Some(heightmap) = heightmap.as_deref() else {
                    warn!("Terrain heightmap phase raised without a heightmap, road bed skipped");
                    continue;
                };
                debug!(
                    "Starting road bed pass over {}x{} samples",
                    heightmap.width, heightmap.height
                );
                commands.insert_resource(BedShapingJob::new(
                    heightmap,
                    BedParams::from_settings(&settings),
                ));
            }
            _ => {}
        }
    }
}

fn tick_bed_shaping(
    mut commands: Commands,
    job: Option<ResMut<BedShapingJob>>,
    map: Option<Res<Map>>,
    heightmap: Option<ResMut<HeightMap>>,
    preferences: Res<BuildPreferences>,
    mut shaped: EventWriter<BedShaped>,
) {
    let Some(mut job) = job else {
        return;
    };
    let (Some(map), Some(mut heightmap)) = (map, heightmap) else {
        warn!("Map or heightmap removed during road bed shaping, pass dropped");
        commands.remove_resource::<BedShapingJob>();
        return;
    };

    let budget = SliceBudget::from(&*preferences);
    if !job.tick(&map, &mut heightmap, &budget).is_finished() {
        return;
    }

    let stats = job.stats();
    if preferences.log_features.log_build_time {
        info!(
            "Road bed build time: {:.2} ms over {} frames",
            stats.elapsed.as_secs_f64() * 1000.0,
            stats.slices
        );
    }
    commands.remove_resource::<BedShapingJob>();
    shaped.write(BedShaped { stats });
}
