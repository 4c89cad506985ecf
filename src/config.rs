//! Validated server settings and dimension to directory resolution.
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::args::Args;
use crate::consts::{dimensions, directory_paths};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Tick interval must be at least 1 ms")]
    InvalidTickInterval,

    #[error("Border threshold must be a finite, non-negative number, got {0}")]
    InvalidBorderThreshold(f64),

    #[error("Region file extension must not be empty")]
    EmptyRegionExtension,
}

/// Settings of the running server, built once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub world_dir: PathBuf,
    pub zone_store: PathBuf,
    pub region_extension: String,
    pub tick_interval: Duration,
    pub border_threshold: f64,
    pub command_permission: u8,
    pub reset_permission: u8,
}

impl Settings {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        if args.tick_ms == 0 {
            return Err(ConfigError::InvalidTickInterval);
        }
        if !args.border_threshold.is_finite() || args.border_threshold < 0.0 {
            return Err(ConfigError::InvalidBorderThreshold(args.border_threshold));
        }
        let region_extension = args.region_ext.trim_start_matches('.').to_string();
        if region_extension.is_empty() {
            return Err(ConfigError::EmptyRegionExtension);
        }

        Ok(Self {
            world_dir: args.world.clone(),
            zone_store: args.zones.clone(),
            region_extension,
            tick_interval: Duration::from_millis(args.tick_ms),
            border_threshold: args.border_threshold,
            command_permission: args.command_permission,
            reset_permission: args.reset_permission.max(args.command_permission),
        })
    }

    /// Directory holding the region files of `dimension`, a normalized dimension key.
    pub fn region_dir(&self, dimension: &str) -> PathBuf {
        match dimension {
            dimensions::OVERWORLD => self.world_dir.join(directory_paths::OVERWORLD),
            dimensions::NETHER => self.world_dir.join(directory_paths::NETHER),
            dimensions::THE_END => self.world_dir.join(directory_paths::THE_END),
            other => {
                let (namespace, path) = other
                    .split_once(':')
                    .unwrap_or((dimensions::DEFAULT_NAMESPACE, other));
                self.world_dir
                    .join(directory_paths::CUSTOM_DIMENSIONS)
                    .join(namespace)
                    .join(path)
                    .join("region")
            }
        }
    }
}

/// Normalizes a dimension key: lowercase, with the default namespace added when missing.
/// `Overworld` and `minecraft:overworld` are the same dimension.
pub fn normalize_dimension(input: &str) -> String {
    let input = input.trim().to_lowercase();
    if input.contains(':') {
        input
    } else {
        format!("{}:{input}", dimensions::DEFAULT_NAMESPACE)
    }
}

/// The path part of a dimension key, used in player facing messages.
pub fn dimension_label(dimension: &str) -> &str {
    dimension.rsplit(':').next().unwrap_or(dimension)
}
