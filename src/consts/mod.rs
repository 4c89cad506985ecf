//! This module is where we store constants, like filepaths, the region file layout or the
//! feedback strings shown to players and operators.

/// Layout of the region container format. Only the header and sector layer is described here,
/// chunk payloads are never decoded.
pub mod region {
    /// Size of one allocation unit in a region file.
    pub const SECTOR_BYTES: u64 = 4096;

    /// Chunks per region side.
    pub const CHUNKS_PER_SIDE: i32 = 32;

    /// Number of slots in each header table (32 * 32).
    pub const SLOT_COUNT: usize = 1024;

    /// Size of one header entry, location and timestamp entries alike.
    pub const ENTRY_BYTES: usize = 4;

    /// Byte offset of the timestamp table, right after the location table.
    pub const TIMESTAMP_TABLE_OFFSET: u64 = SECTOR_BYTES;

    /// Both header tables together.
    pub const HEADER_SECTORS: u32 = 2;

    /// Blocks per chunk side.
    pub const BLOCKS_PER_CHUNK: i32 = 16;

    /// Default extension of region files.
    pub const DEFAULT_EXTENSION: &str = "mca";
}

/// Limits on zone definitions accepted from the command surface.
pub mod zones {
    pub const MIN_RADIUS: i32 = 1;
    pub const MAX_RADIUS: i32 = 10_000;

    /// Borders are shown for zones whose center is within `radius + NEARBY_MARGIN` blocks.
    pub const NEARBY_MARGIN: f64 = 50.0;

    /// When outside every nearby zone, the closest zone is shown within `radius + DANGER_MARGIN`.
    pub const DANGER_MARGIN: f64 = 100.0;
}

/// Server logging messages.
pub mod messages {

    use colored::*;
    use once_cell::sync::Lazy;

    pub static SERVER_STARTING: Lazy<String> =
        Lazy::new(|| "Starting softborder zone host".bold().to_string());

    pub static SERVER_STARTED: Lazy<String> =
        Lazy::new(|| "[ SERVER STARTED ]".bright_green().bold().to_string());

    pub static SERVER_SHUTDOWN_SUCCESS: Lazy<String> =
        Lazy::new(|| "[ SERVER SHUT DOWN ]".bright_red().bold().to_string());

    pub static SERVER_SHUTDOWN_ERROR: Lazy<String> = Lazy::new(|| {
        "[ SERVER SHUT DOWN WITH ERROR ]"
            .bright_red()
            .bold()
            .to_string()
    });

    pub static SERVER_SHUTDOWN_CTRL_C: Lazy<String> = Lazy::new(|| {
        "[ SERVER SHUT DOWN WITH CTRL+C ]"
            .bright_red()
            .bold()
            .to_string()
    });

    pub static RESTART_ADVICE: Lazy<String> = Lazy::new(|| {
        "STRONGLY recommend RESTARTING the server for changes to safely take effect."
            .yellow()
            .bold()
            .to_string()
    });

    pub const ENTER_ZONE: &str = "You have returned to a safe zone";
    pub const LEAVE_ZONE: &str =
        "You have entered an area which might be wiped, be aware any builds may be lost";
    pub const EVACUATION_NOTICE: &str =
        "You are being disconnected: your current chunk is being reset.";
    pub const EVACUATION_REASON: &str = "Chunk deletion in progress - please rejoin in a moment";
}

/// Module used to store file paths relative to the server binary.
pub mod file_paths {
    /// Zone definitions, rewritten on every change.
    pub const ZONE_STORE: &str = "config/softborder.json";
}

/// Region directories of the vanilla dimensions, relative to the world directory.
pub mod directory_paths {
    pub const WORLDS_DIRECTORY: &str = "world";
    pub const OVERWORLD: &str = "region";
    pub const NETHER: &str = "DIM-1/region";
    pub const THE_END: &str = "DIM1/region";
    /// Modded dimensions live under `dimensions/<namespace>/<path>/region`.
    pub const CUSTOM_DIMENSIONS: &str = "dimensions";
}

/// Well-known dimension keys.
pub mod dimensions {
    pub const DEFAULT_NAMESPACE: &str = "minecraft";
    pub const OVERWORLD: &str = "minecraft:overworld";
    pub const NETHER: &str = "minecraft:the_nether";
    pub const THE_END: &str = "minecraft:the_end";
}
