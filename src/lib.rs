pub mod build_phase;
pub mod config;
pub mod errors;
pub mod generation;
pub mod grid;
pub mod map;
pub mod plugins;
pub mod resources;
pub mod roads;
pub mod terrain;

// Selective re-exports for external consumers

// Plugins - the binary adds them directly
pub use plugins::*;

pub use build_phase::{BedShaped, BuildPhase, BuildPhaseCompleted};
pub use errors::{RoadbedError, RoadbedResult};
pub use grid::{CellGeometry, GeometryKind, GridCoord};
pub use map::{Cell, CellContent, CellType, Map};
pub use roads::{PathSegment, RoadFeatures, RoadNetwork, RoadNetworkExtractor};
pub use terrain::{BedShapingJob, HeightMap, TakenArea, TakenAreaType};
