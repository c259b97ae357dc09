use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoadbedError {
    // Config-related errors
    #[error("Failed to get config directory")]
    ConfigDirNotFound,

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    SerializationFailed(#[from] toml::ser::Error),

    #[error("Failed to deserialize config: {0}")]
    DeserializationFailed(#[from] toml::de::Error),

    // World data errors
    #[error("Invalid map data: {reason}")]
    InvalidMapData { reason: String },

    #[error("Invalid height map: {reason}")]
    InvalidHeightMap { reason: String },

    #[error("Height map file not found at path: {path}")]
    HeightMapFileNotFound { path: PathBuf },

    #[error("Corrupted height map file: {reason}")]
    CorruptedHeightMapFile { reason: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] validator::ValidationErrors),
}

/// Result type alias for all fallible operations
pub type RoadbedResult<T> = Result<T, RoadbedError>;
