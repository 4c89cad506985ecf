//! Files owned by the server: the zone store and the directories it lives in.
mod utils;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use crate::config::Settings;
use crate::zone::Zone;

/// Zone definitions as stored on disk: dimension key to zones, in insertion order.
pub type ZoneMap = BTreeMap<String, Vec<Zone>>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Zone store IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Zone store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Initializes the server's required directories.
pub fn init(settings: &Settings) -> io::Result<()> {
    if let Some(parent) = settings.zone_store.parent() {
        if !parent.as_os_str().is_empty() {
            utils::create_dir(parent)?;
        }
    }
    if !settings.world_dir.exists() {
        info!(
            "World directory {} does not exist yet, resets will find nothing to delete",
            settings.world_dir.display()
        );
    }
    Ok(())
}

/// Reads the zone store. A missing file is reported as `io::ErrorKind::NotFound`.
pub fn read_zone_store(path: &Path) -> Result<ZoneMap, StoreError> {
    let mut content = fs::read_to_string(path)?;

    if content.starts_with('\u{feff}') {
        content = content.trim_start_matches('\u{feff}').to_string();
    }
    if content.trim().is_empty() {
        return Ok(ZoneMap::new());
    }

    Ok(serde_json::from_str(&content)?)
}

/// Rewrites the whole zone store. The new content goes to a sibling file first and is renamed
/// over the old one, so a crash never leaves a half-written store.
pub fn write_zone_store(path: &Path, zones: &ZoneMap) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            utils::create_dir(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(zones)?;
    let tmp = path.with_extension("json.tmp");
    utils::write_synced(&tmp, json.as_bytes())?;
    fs::rename(&tmp, path)?;

    debug!("Saved {} dimensions to {}", zones.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_zone_store_roundtrip_keeps_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config").join("softborder.json");

        let mut zones = ZoneMap::new();
        zones.insert(
            "minecraft:overworld".to_string(),
            vec![
                Zone::new("minecraft:overworld", "b", 0, 0, 10).unwrap(),
                Zone::new("minecraft:overworld", "a", 100, -100, 5).unwrap(),
            ],
        );
        zones.insert(
            "minecraft:the_nether".to_string(),
            vec![Zone::new("minecraft:the_nether", "hub", 8, 8, 64).unwrap()],
        );

        write_zone_store(&path, &zones).unwrap();
        assert_eq!(read_zone_store(&path).unwrap(), zones);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_read_zone_store_tolerates_bom_and_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("softborder.json");

        fs::write(&path, "").unwrap();
        assert!(read_zone_store(&path).unwrap().is_empty());

        fs::write(
            &path,
            "\u{feff}{\"minecraft:overworld\":[{\"id\":\"6f1c1b5e-4a8e-4c43-9a57-0e6a4f1e2b3c\",\"dimension\":\"minecraft:overworld\",\"centerX\":1,\"centerZ\":2,\"radius\":3}]}",
        )
        .unwrap();
        let zones = read_zone_store(&path).unwrap();
        let zone = &zones["minecraft:overworld"][0];
        assert_eq!(zone.name, "Unnamed Zone");
        assert_eq!((zone.center_x, zone.center_z, zone.radius), (1, 2, 3));
    }

    #[test]
    fn test_read_zone_store_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("softborder.json");
        assert!(matches!(read_zone_store(&path), Err(StoreError::Io(_))));

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(read_zone_store(&path), Err(StoreError::Json(_))));
    }
}
