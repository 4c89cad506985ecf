//! Command line arguments.
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::consts;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Protected zones and chunk resets for a Minecraft world")]
pub struct Args {
    /// World directory holding the region folders.
    #[arg(long, default_value = consts::directory_paths::WORLDS_DIRECTORY)]
    pub world: PathBuf,

    /// Zone store file.
    #[arg(long, default_value = consts::file_paths::ZONE_STORE)]
    pub zones: PathBuf,

    /// Extension of region files.
    #[arg(long, default_value = consts::region::DEFAULT_EXTENSION)]
    pub region_ext: String,

    /// Milliseconds between two ticks of the host loop.
    #[arg(long, default_value_t = 50)]
    pub tick_ms: u64,

    /// Distance from a zone edge at which its border becomes visible.
    #[arg(long, default_value_t = 30.0)]
    pub border_threshold: f64,

    /// Permission level needed for the zone commands.
    #[arg(long, default_value_t = 3)]
    pub command_permission: u8,

    /// Permission level needed for `softborder reset`.
    #[arg(long, default_value_t = 4)]
    pub reset_permission: u8,

    #[arg(long, default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,
}

/// Parses the process arguments.
pub fn init() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["softborder"]);
        assert_eq!(args.world, PathBuf::from("world"));
        assert_eq!(args.zones, PathBuf::from("config/softborder.json"));
        assert_eq!(args.region_ext, "mca");
        assert_eq!(args.tick_ms, 50);
        assert_eq!(args.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "softborder",
            "--world",
            "/srv/mc/world",
            "--tick-ms",
            "100",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.world, PathBuf::from("/srv/mc/world"));
        assert_eq!(args.tick_ms, 100);
        assert_eq!(args.log_level, LevelFilter::Debug);
    }
}
