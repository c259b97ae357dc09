pub mod gizmos;
pub mod road_network;

pub use gizmos::*;
pub use road_network::*;
