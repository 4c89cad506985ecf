use std::collections::HashSet;

use crate::region_parser::chunk::ChunkPos;
use crate::zone::registry::ZoneRegistry;

/// The chunks of `existing` that no zone of `dimension` protects: the deletion worklist.
pub fn plan(
    registry: &ZoneRegistry,
    dimension: &str,
    existing: &HashSet<ChunkPos>,
) -> HashSet<ChunkPos> {
    registry.unprotected_chunks(dimension, existing)
}
