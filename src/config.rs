use crate::errors::{RoadbedError, RoadbedResult};
use crate::resources::RoadbedConfig;
use bevy::prelude::*;
use std::fs;
use std::path::PathBuf;

pub mod range_types;

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().and_then(|mut path| {
        path.push("roadbed");
        fs::create_dir_all(&path).ok()?;
        path.push("config.toml");
        Some(path)
    })
}

/// Load the config file, falling back to defaults when it is missing or unreadable
pub fn load_config() -> RoadbedConfig {
    if let Some(config_path) = get_config_path() {
        if let Ok(contents) = fs::read_to_string(&config_path) {
            match toml::from_str::<RoadbedConfig>(&contents) {
                Ok(config) => return config,
                Err(err) => warn!(
                    "Ignoring malformed config at {}: {err}",
                    config_path.display()
                ),
            }
        }
    }
    RoadbedConfig::default()
}

pub fn save_config(config: &RoadbedConfig) -> RoadbedResult<PathBuf> {
    let config_path = get_config_path().ok_or(RoadbedError::ConfigDirNotFound)?;
    let contents = toml::to_string_pretty(config)?;
    fs::write(&config_path, contents)?;
    Ok(config_path)
}
