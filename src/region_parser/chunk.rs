use std::fmt;

use crate::consts::region::{BLOCKS_PER_CHUNK, CHUNKS_PER_SIDE};

/// Position of a chunk on the chunk grid (16 blocks per unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk holding the block at `(x, z)`. Floors, so negative blocks land in negative
    /// chunks (block -1 is in chunk -1).
    pub fn from_block(x: f64, z: f64) -> Self {
        let x = x.floor() as i32;
        let z = z.floor() as i32;
        Self {
            x: x.div_euclid(BLOCKS_PER_CHUNK),
            z: z.div_euclid(BLOCKS_PER_CHUNK),
        }
    }

    /// Smallest block coordinates covered by this chunk.
    pub const fn min_block(&self) -> (i64, i64) {
        let size = BLOCKS_PER_CHUNK as i64;
        (self.x as i64 * size, self.z as i64 * size)
    }

    /// Largest block coordinates covered by this chunk (inclusive).
    pub const fn max_block(&self) -> (i64, i64) {
        let (x, z) = self.min_block();
        let size = BLOCKS_PER_CHUNK as i64;
        (x + size - 1, z + size - 1)
    }

    /// The region file that stores this chunk.
    pub const fn region(&self) -> RegionPos {
        RegionPos {
            x: self.x >> 5,
            z: self.z >> 5,
        }
    }

    /// Position inside the owning region, both components in `[0, 32)`.
    pub const fn local(&self) -> (usize, usize) {
        ((self.x & 31) as usize, (self.z & 31) as usize)
    }

    /// Index of this chunk's slot in the region header tables.
    pub const fn header_index(&self) -> usize {
        let (x, z) = self.local();
        x + z * CHUNKS_PER_SIDE as usize
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// Position of a region file, as embedded in its `r.<x>.<z>.<ext>` file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionPos {
    pub x: i32,
    pub z: i32,
}

impl RegionPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk at `(local_x, local_z)` inside this region.
    pub const fn chunk(&self, local_x: usize, local_z: usize) -> ChunkPos {
        ChunkPos {
            x: self.x * CHUNKS_PER_SIDE + local_x as i32,
            z: self.z * CHUNKS_PER_SIDE + local_z as i32,
        }
    }

    pub fn file_name(&self, extension: &str) -> String {
        format!("r.{}.{}.{}", self.x, self.z, extension)
    }

    /// Parses `r.<x>.<z>.<extension>`. Returns `None` for anything else, including regions
    /// whose chunk coordinates would not fit in an `i32`.
    pub fn parse_file_name(name: &str, extension: &str) -> Option<Self> {
        let mut parts = name.split('.');
        if parts.next()? != "r" {
            return None;
        }
        let x: i32 = parts.next()?.parse().ok()?;
        let z: i32 = parts.next()?.parse().ok()?;
        if parts.next()? != extension || parts.next().is_some() {
            return None;
        }

        let range = (i32::MIN >> 5)..=(i32::MAX >> 5);
        if !range.contains(&x) || !range.contains(&z) {
            return None;
        }
        Some(Self { x, z })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_block_floors_negative_coordinates() {
        assert_eq!(ChunkPos::from_block(0.0, 15.9), ChunkPos::new(0, 0));
        assert_eq!(ChunkPos::from_block(16.0, 0.0), ChunkPos::new(1, 0));
        assert_eq!(ChunkPos::from_block(-0.5, -1.0), ChunkPos::new(-1, -1));
        assert_eq!(ChunkPos::from_block(-16.0, -17.0), ChunkPos::new(-1, -2));
    }

    #[test]
    fn test_region_and_local_of_negative_chunk() {
        let chunk = ChunkPos::new(-1, -33);
        assert_eq!(chunk.region(), RegionPos::new(-1, -2));
        assert_eq!(chunk.local(), (31, 31));
        assert_eq!(chunk.region().chunk(31, 31), chunk);
    }

    #[test]
    fn test_header_index() {
        assert_eq!(ChunkPos::new(0, 0).header_index(), 0);
        assert_eq!(ChunkPos::new(1, 1).header_index(), 33);
        assert_eq!(ChunkPos::new(63, 32).header_index(), 31);
    }

    #[test]
    fn test_parse_file_name() {
        assert_eq!(
            RegionPos::parse_file_name("r.-3.12.mca", "mca"),
            Some(RegionPos::new(-3, 12))
        );
        assert_eq!(RegionPos::parse_file_name("r.0.0.mcc", "mca"), None);
        assert_eq!(RegionPos::parse_file_name("r.a.0.mca", "mca"), None);
        assert_eq!(RegionPos::parse_file_name("r.0.mca", "mca"), None);
        assert_eq!(RegionPos::parse_file_name("x.0.0.mca", "mca"), None);
        assert_eq!(RegionPos::parse_file_name("r.0.0.mca.bak", "mca"), None);
        assert_eq!(RegionPos::parse_file_name("r.2147483647.0.mca", "mca"), None);
        assert_eq!(RegionPos::new(2, -1).file_name("mca"), "r.2.-1.mca");
    }
}
