use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use log::info;

/// Creates a directory and its parents if it does not already exist.
pub fn create_dir(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path)?;
    info!("Created dir {}", path.display());
    Ok(())
}

/// Writes `content` to `path`, truncating it, and syncs it to disk.
pub fn write_synced(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}
