//! Connected players as seen by the zone logic.
pub mod presence;

use uuid::Uuid;

use crate::region_parser::chunk::ChunkPos;

/// Snapshot of a connected player.
#[derive(Debug, Clone, PartialEq)]
pub struct OnlinePlayer {
    pub uuid: Uuid,
    pub name: String,
    pub dimension: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub permission_level: u8,
}

impl OnlinePlayer {
    pub fn new(name: impl Into<String>, dimension: impl Into<String>, x: f64, z: f64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            dimension: dimension.into(),
            x,
            y: 64.0,
            z,
            permission_level: 0,
        }
    }

    /// The chunk the player stands in.
    pub fn chunk(&self) -> ChunkPos {
        ChunkPos::from_block(self.x, self.z)
    }
}
