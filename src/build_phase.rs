use crate::terrain::ShapingStats;
use bevy::prelude::*;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Milestones of one world build, in the order they are raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
pub enum BuildPhase {
    #[display("map created")]
    MapCreated,
    #[display("cell heights created")]
    CellHeightsCreated,
    #[display("terrain heightmap created")]
    TerrainHeightMapCreated,
    #[display("completed")]
    Completed,
}

impl BuildPhase {
    pub const ALL: [BuildPhase; 4] = [
        BuildPhase::MapCreated,
        BuildPhase::CellHeightsCreated,
        BuildPhase::TerrainHeightMapCreated,
        BuildPhase::Completed,
    ];

    pub fn next(self) -> Option<BuildPhase> {
        match self {
            BuildPhase::MapCreated => Some(BuildPhase::CellHeightsCreated),
            BuildPhase::CellHeightsCreated => Some(BuildPhase::TerrainHeightMapCreated),
            BuildPhase::TerrainHeightMapCreated => Some(BuildPhase::Completed),
            BuildPhase::Completed => None,
        }
    }
}

/// Raised by the build pipeline when a phase is done
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildPhaseCompleted(pub BuildPhase);

/// Raised once the road bed pass has finished rewriting the heightmap
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BedShaped {
    pub stats: ShapingStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        let mut phase = BuildPhase::MapCreated;
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            assert!(next > phase);
            seen.push(next);
            phase = next;
        }
        assert_eq!(seen, BuildPhase::ALL.to_vec());
        assert_eq!(BuildPhase::CellHeightsCreated.to_string(), "cell heights created");
    }
}
