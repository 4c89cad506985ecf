//! The set of zones per dimension, persisted to the zone store after every change.
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::fs_manager::{self, StoreError, ZoneMap};
use crate::region_parser::chunk::ChunkPos;

use super::{Zone, ZoneError};

/// Zones of every dimension. Within a dimension zones keep their insertion order, which decides
/// which zone wins when overlapping zones contain the same point.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    zones: ZoneMap,
    /// Where changes are saved. `None` keeps the registry in memory only.
    store: Option<PathBuf>,
}

impl ZoneRegistry {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the registry from `path`. Never fails: a missing or unreadable store gives an empty
    /// registry and a warning. Later changes are saved to `path` either way.
    pub fn load(path: &Path) -> Self {
        let zones = match fs_manager::read_zone_store(path) {
            Ok(zones) => {
                let count: usize = zones.values().map(Vec::len).sum();
                info!("Loaded {count} zones from {}", path.display());
                zones
            }
            Err(StoreError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "Zone store {} not found, starting with no zones",
                    path.display()
                );
                ZoneMap::new()
            }
            Err(e) => {
                warn!(
                    "Failed to load zones from {}: {e}. Starting with no zones",
                    path.display()
                );
                ZoneMap::new()
            }
        };

        Self {
            zones,
            store: Some(path.to_path_buf()),
        }
    }

    /// Adds a zone to its dimension and saves the registry.
    pub fn add(&mut self, zone: Zone) -> Result<(), ZoneError> {
        if self.zone_by_name(&zone.dimension, &zone.name).is_some() {
            return Err(ZoneError::DuplicateName(zone.name));
        }
        self.zones
            .entry(zone.dimension.clone())
            .or_default()
            .push(zone);
        self.persist();
        Ok(())
    }

    /// Removes the zone named `name` (any case) from `dimension`. Returns whether one was removed.
    pub fn remove_by_name(&mut self, dimension: &str, name: &str) -> bool {
        let Some(zones) = self.zones.get_mut(dimension) else {
            return false;
        };
        let before = zones.len();
        zones.retain(|zone| !zone.is_named(name));
        let removed = zones.len() != before;

        if zones.is_empty() {
            self.zones.remove(dimension);
        }
        if removed {
            self.persist();
        }
        removed
    }

    /// A copy of the zones of `dimension`, in insertion order.
    pub fn zones_for(&self, dimension: &str) -> Vec<Zone> {
        self.zones.get(dimension).cloned().unwrap_or_default()
    }

    fn zones_in(&self, dimension: &str) -> &[Zone] {
        self.zones.get(dimension).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_zones(&self) -> &ZoneMap {
        &self.zones
    }

    pub fn zone_by_name(&self, dimension: &str, name: &str) -> Option<&Zone> {
        self.zones_in(dimension).iter().find(|zone| zone.is_named(name))
    }

    /// The first zone, in insertion order, that contains the point.
    pub fn zone_containing(&self, dimension: &str, x: f64, z: f64) -> Option<&Zone> {
        self.zones_in(dimension)
            .iter()
            .find(|zone| zone.contains_point(x, z))
    }

    pub fn is_chunk_protected(&self, dimension: &str, chunk: ChunkPos) -> bool {
        self.zones_in(dimension)
            .iter()
            .any(|zone| zone.contains_chunk(chunk))
    }

    /// The chunks of `candidates` that no zone of `dimension` protects.
    pub fn unprotected_chunks(
        &self,
        dimension: &str,
        candidates: &HashSet<ChunkPos>,
    ) -> HashSet<ChunkPos> {
        candidates
            .iter()
            .filter(|chunk| !self.is_chunk_protected(dimension, **chunk))
            .copied()
            .collect()
    }

    fn persist(&self) {
        let Some(path) = &self.store else {
            return;
        };
        if let Err(e) = fs_manager::write_zone_store(path, &self.zones) {
            error!("Failed to save zones to {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use tempfile::tempdir;

    const OVERWORLD: &str = "minecraft:overworld";

    fn zone(name: &str, x: i32, z: i32, radius: i32) -> Zone {
        Zone::new(OVERWORLD, name, x, z, radius).unwrap()
    }

    #[test]
    fn test_add_rejects_duplicate_names_per_dimension() {
        let mut registry = ZoneRegistry::in_memory();
        registry.add(zone("Spawn", 0, 0, 10)).unwrap();

        assert_eq!(
            registry.add(zone("spawn", 50, 50, 10)),
            Err(ZoneError::DuplicateName("spawn".to_string()))
        );
        assert_eq!(registry.zones_for(OVERWORLD).len(), 1);

        let nether = Zone::new("minecraft:the_nether", "spawn", 0, 0, 10).unwrap();
        registry.add(nether).unwrap();
        assert_eq!(registry.zones_for("minecraft:the_nether").len(), 1);
    }

    #[test]
    fn test_remove_by_name() {
        let mut registry = ZoneRegistry::in_memory();
        registry.add(zone("Spawn", 0, 0, 10)).unwrap();
        registry.add(zone("Farm", 100, 0, 10)).unwrap();

        assert!(!registry.remove_by_name(OVERWORLD, "nothing"));
        assert!(!registry.remove_by_name("minecraft:the_end", "spawn"));
        assert!(registry.remove_by_name(OVERWORLD, "SPAWN"));
        let names: Vec<_> = registry
            .zones_for(OVERWORLD)
            .into_iter()
            .map(|z| z.name)
            .collect();
        assert_eq!(names, vec!["Farm"]);
    }

    #[test]
    fn test_zone_containing_first_match_wins() {
        let mut registry = ZoneRegistry::in_memory();
        registry.add(zone("first", 0, 0, 10)).unwrap();
        registry.add(zone("second", 5, 0, 10)).unwrap();

        assert_eq!(registry.zone_containing(OVERWORLD, 6.0, 0.0).unwrap().name, "first");
        assert_eq!(registry.zone_containing(OVERWORLD, 14.0, 0.0).unwrap().name, "second");
        assert!(registry.zone_containing(OVERWORLD, 30.0, 0.0).is_none());
        assert!(registry.zone_containing("minecraft:the_end", 0.0, 0.0).is_none());
    }

    #[test]
    fn test_unprotected_chunks_is_a_disjoint_subset() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let mut registry = ZoneRegistry::in_memory();
            for i in 0..rng.gen_range(0..4) {
                let z = zone(
                    &format!("z{i}"),
                    rng.gen_range(-200..200),
                    rng.gen_range(-200..200),
                    rng.gen_range(1..80),
                );
                registry.add(z).unwrap();
            }
            let candidates: HashSet<ChunkPos> = (0..100)
                .map(|_| ChunkPos::new(rng.gen_range(-16..16), rng.gen_range(-16..16)))
                .collect();

            let unprotected = registry.unprotected_chunks(OVERWORLD, &candidates);
            assert!(unprotected.is_subset(&candidates));
            for chunk in &candidates {
                let protected = registry
                    .zones_for(OVERWORLD)
                    .iter()
                    .any(|z| z.contains_chunk(*chunk));
                assert_eq!(unprotected.contains(chunk), !protected);
            }
        }
    }

    #[test]
    fn test_changes_are_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config").join("softborder.json");

        let mut registry = ZoneRegistry::load(&path);
        assert!(registry.all_zones().is_empty());
        registry.add(zone("b", 0, 0, 10)).unwrap();
        registry.add(zone("a", 100, 100, 3)).unwrap();

        let reloaded = ZoneRegistry::load(&path);
        assert_eq!(reloaded.all_zones(), registry.all_zones());

        registry.remove_by_name(OVERWORLD, "b");
        let reloaded = ZoneRegistry::load(&path);
        assert_eq!(reloaded.zones_for(OVERWORLD)[0].name, "a");
    }

    #[test]
    fn test_unreadable_store_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("softborder.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let registry = ZoneRegistry::load(&path);
        assert!(registry.all_zones().is_empty());
    }
}
