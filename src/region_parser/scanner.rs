//! Enumerates the chunks that physically exist in a region directory by reading location tables.
use std::{
    collections::HashSet,
    fs::{self, File},
    io::BufReader,
    path::Path,
};

use log::{debug, info, warn};

use crate::consts::region::{CHUNKS_PER_SIDE, ENTRY_BYTES, SLOT_COUNT};

use super::{
    chunk::{ChunkPos, RegionPos},
    region::RegionFile,
    RegionError,
};

/// Result of scanning one region directory.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Every structurally valid chunk found.
    pub chunks: HashSet<ChunkPos>,
    pub files_scanned: usize,
    /// Files skipped because of a malformed name or a truncated header.
    pub skipped_files: usize,
    /// Present but corrupt location entries. They are neither protected nor deleted.
    pub corrupt_entries: usize,
}

/// Scans every `r.<x>.<z>.<extension>` file in `dir`.
///
/// Malformed names and corrupt entries are logged and skipped. Any I/O error aborts the scan,
/// so nothing is ever planned from a partial view of a file.
pub fn scan_region_dir(dir: &Path, extension: &str) -> Result<ScanReport, RegionError> {
    let suffix = format!(".{extension}");
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| RegionError::io(dir, e))? {
        let entry = entry.map_err(|e| RegionError::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| RegionError::io(dir, e))?;
        if !file_type.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("r.") && name.ends_with(&suffix) {
            names.push(name);
        }
    }
    names.sort();

    info!("Found {} region files to scan in {}", names.len(), dir.display());

    let mut report = ScanReport::default();
    for name in names {
        let Some(region) = RegionPos::parse_file_name(&name, extension) else {
            warn!(
                "Skipping non-standard region file: {}",
                RegionError::MalformedFilename(name)
            );
            report.skipped_files += 1;
            continue;
        };
        scan_region_file(&dir.join(&name), region, &mut report)?;
    }

    debug!(
        "Scan of {} done: {} chunks, {} corrupt entries, {} skipped files",
        dir.display(),
        report.chunks.len(),
        report.corrupt_entries,
        report.skipped_files
    );
    Ok(report)
}

/// Adds the chunks of one region file to `report`.
fn scan_region_file(
    path: &Path,
    region: RegionPos,
    report: &mut ScanReport,
) -> Result<(), RegionError> {
    let file = File::open(path).map_err(|e| RegionError::io(path, e))?;
    let len = file
        .metadata()
        .map_err(|e| RegionError::io(path, e))?
        .len();

    if len == 0 {
        debug!("Region file {} is empty", path.display());
        report.files_scanned += 1;
        return Ok(());
    }
    if len < (SLOT_COUNT * ENTRY_BYTES) as u64 {
        warn!(
            "Skipping {}",
            RegionError::TruncatedHeader {
                path: path.to_path_buf(),
                len
            }
        );
        report.skipped_files += 1;
        return Ok(());
    }

    let mut region_file = RegionFile::new(BufReader::new(file));
    let locations = region_file
        .read_locations()
        .map_err(|e| RegionError::io(path, e))?;

    for (slot, entry) in locations.iter().enumerate() {
        if entry.is_absent() {
            continue;
        }
        let local_x = slot % CHUNKS_PER_SIDE as usize;
        let local_z = slot / CHUNKS_PER_SIDE as usize;
        match entry.validate(slot) {
            Ok(()) => {
                report.chunks.insert(region.chunk(local_x, local_z));
            }
            Err(e) => {
                debug!(
                    "Skipping potentially corrupted chunk at local ({local_x}, {local_z}) in {}: {e}",
                    path.display()
                );
                report.corrupt_entries += 1;
            }
        }
    }
    report.files_scanned += 1;
    Ok(())
}
