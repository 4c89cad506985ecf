//! Protected zones: axis-aligned squares of side `2 * radius + 1` blocks around a center.

pub mod border;
pub mod registry;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{consts::zones::MIN_RADIUS, region_parser::chunk::ChunkPos};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZoneError {
    #[error("A zone with the name '{0}' already exists in this dimension")]
    DuplicateName(String),

    #[error("Zone with name '{0}' not found in current dimension")]
    NotFound(String),

    #[error("Invalid zone radius {0}, it must be at least 1")]
    InvalidRadius(i32),
}

fn default_name() -> String {
    "Unnamed Zone".to_string()
}

/// A named protected zone in one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: Uuid,
    pub dimension: String,
    pub center_x: i32,
    pub center_z: i32,
    pub radius: i32,
    #[serde(default = "default_name")]
    pub name: String,
}

impl Zone {
    /// Creates a zone with a fresh id.
    pub fn new(
        dimension: impl Into<String>,
        name: impl Into<String>,
        center_x: i32,
        center_z: i32,
        radius: i32,
    ) -> Result<Self, ZoneError> {
        if radius < MIN_RADIUS {
            return Err(ZoneError::InvalidRadius(radius));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            dimension: dimension.into(),
            center_x,
            center_z,
            radius,
            name: name.into(),
        })
    }

    /// Inclusive block bounds `(min_x, min_z, max_x, max_z)`.
    pub fn bounds(&self) -> (i64, i64, i64, i64) {
        let (x, z, r) = (
            self.center_x as i64,
            self.center_z as i64,
            self.radius as i64,
        );
        (x - r, z - r, x + r, z + r)
    }

    /// Whether any block of the chunk lies in the zone. A chunk that only touches the zone with
    /// one corner block is protected.
    pub fn contains_chunk(&self, chunk: ChunkPos) -> bool {
        let (min_x, min_z, max_x, max_z) = self.bounds();
        let (chunk_min_x, chunk_min_z) = chunk.min_block();
        let (chunk_max_x, chunk_max_z) = chunk.max_block();

        !(chunk_max_x < min_x || chunk_min_x > max_x || chunk_max_z < min_z || chunk_min_z > max_z)
    }

    /// Inclusive bounding-box test.
    pub fn contains_point(&self, x: f64, z: f64) -> bool {
        let (min_x, min_z, max_x, max_z) = self.bounds();
        x >= min_x as f64 && x <= max_x as f64 && z >= min_z as f64 && z <= max_z as f64
    }

    /// Smallest signed distance to the four edges. Negative when the point is outside.
    pub fn border_distance(&self, x: f64, z: f64) -> f64 {
        let (min_x, min_z, max_x, max_z) = self.bounds();
        (x - min_x as f64)
            .min(max_x as f64 - x)
            .min(z - min_z as f64)
            .min(max_z as f64 - z)
    }

    /// Whether the point is inside the zone and at most `threshold` blocks from an edge.
    /// Points outside the zone are never near its border.
    pub fn is_near_border(&self, x: f64, z: f64, threshold: f64) -> bool {
        let distance = self.border_distance(x, z);
        (0.0..=threshold).contains(&distance)
    }

    /// Euclidean distance from the point to the zone center.
    pub fn center_distance(&self, x: f64, z: f64) -> f64 {
        let dx = x - self.center_x as f64;
        let dz = z - self.center_z as f64;
        (dx * dx + dz * dz).sqrt()
    }

    /// Whether `name` refers to this zone.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}
