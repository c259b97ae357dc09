use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;
use roadbed::config::{load_config, save_config};
use roadbed::generation::{WorldGenerationConfig, WorldGenerator};
use roadbed::{
    BuildPhase, BuildPhaseCompleted, GeometryKind, HeightMap, Map, RoadNetwork, RoadNetworkPlugin,
    RoadbedError, RoadbedResult, run_until_bed_shaped,
};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Clone)]
#[command(name = "roadbed")]
#[command(about = "Generate a world, extract its road network and carve the road bed")]
struct Args {
    /// Random seed for reproducible generation
    #[arg(long)]
    seed: Option<u32>,

    /// Cell tessellation (hex, rect)
    #[arg(long, default_value = "hex")]
    geometry: GeometryKind,

    /// Cells per map side
    #[arg(long, default_value = "24")]
    size: u32,

    /// Cell radius in world units
    #[arg(long, default_value = "5.0")]
    cell_radius: f32,

    /// Heightmap sample spacing in world units
    #[arg(long, default_value = "1.0")]
    sample_spacing: f32,

    /// Number of ruins to connect
    #[arg(long, default_value = "5")]
    ruins: usize,

    /// Number of gates on the map border
    #[arg(long, default_value = "2")]
    gates: usize,

    /// Write the shaped heightmap here (bincode)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Save the effective configuration to the config directory
    #[arg(long)]
    write_config: bool,
}

fn main() -> RoadbedResult<()> {
    let args = Args::parse();
    let config = load_config();
    if args.write_config {
        let path = save_config(&config)?;
        println!("Configuration written to {}", path.display());
    }

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()))
        .insert_resource(config.preferences.clone())
        .insert_resource(config.roads.clone())
        .add_plugins(RoadNetworkPlugin);
    app.finish();
    app.cleanup();

    let started = Instant::now();
    let generator = WorldGenerator::new(WorldGenerationConfig {
        seed: args.seed.unwrap_or_else(rand::random),
        geometry: args.geometry,
        size: args.size,
        cell_radius: args.cell_radius,
        ruins_count: args.ruins,
        gate_count: args.gates,
        log_features: config.preferences.log_features,
        ..WorldGenerationConfig::default()
    });

    let map = generator.generate_map()?;
    app.insert_resource(map);
    raise(&mut app, BuildPhase::MapCreated);

    if let Some(mut map) = app.world_mut().get_resource_mut::<Map>() {
        generator.generate_cell_heights(&mut map);
    }
    raise(&mut app, BuildPhase::CellHeightsCreated);

    let map = app
        .world()
        .get_resource::<Map>()
        .ok_or_else(|| RoadbedError::InvalidMapData {
            reason: "Map was removed during the build".to_string(),
        })?;
    let heightmap = HeightMap::from_map(map, args.sample_spacing)?;
    app.insert_resource(heightmap);
    raise(&mut app, BuildPhase::TerrainHeightMapCreated);

    let frames = 1 + run_until_bed_shaped(&mut app);
    raise(&mut app, BuildPhase::Completed);

    if config.preferences.log_features.log_build_time {
        info!(
            "World built in {:.1} ms ({frames} frames)",
            started.elapsed().as_secs_f64() * 1000.0
        );
    }

    if let Some(network) = app.world().get_resource::<RoadNetwork>() {
        println!(
            "Roads: {} targets, {} junctions, {} road cells, {} crosses, {} segments",
            network.targets.len(),
            network.junctions.len(),
            network.road_cells.len(),
            network.crosses.len(),
            network.segments.len()
        );
    }

    if let Some(output) = &args.output {
        let heightmap = app.world().get_resource::<HeightMap>().ok_or_else(|| {
            RoadbedError::InvalidHeightMap {
                reason: "Heightmap was removed during the build".to_string(),
            }
        })?;
        heightmap.save_to_file(output)?;
        println!("Heightmap written to {}", output.display());
    }
    Ok(())
}

/// Announce a finished phase and let the plugins react to it
fn raise(app: &mut App, phase: BuildPhase) {
    debug!("Build phase: {phase}");
    app.world_mut().send_event(BuildPhaseCompleted(phase));
    app.update();
}
