//! Destructive removal of chunks from region files.
//!
//! For every chunk the payload sectors are zeroed, then its location and timestamp entries.
//! A zeroed location entry is what frees the sectors, there is no separate free list. Each file is
//! synced to disk before the next one is opened. There is no rollback: a failure halfway through a
//! file leaves the chunks processed so far deleted.
use std::{
    collections::{BTreeMap, HashSet},
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use thiserror::Error;

use super::{
    chunk::{ChunkPos, RegionPos},
    region::RegionFile,
};

/// Counters of one erase pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EraseReport {
    /// Entries actually zeroed.
    pub deleted: usize,
    /// Worklist chunks whose location entry was already zero.
    pub already_absent: usize,
    /// Worklist chunks left untouched because their entry is malformed.
    pub corrupt: usize,
    /// Region files of the worklist that do not exist.
    pub missing_files: usize,
    pub files_processed: usize,
}

#[derive(Error, Debug)]
#[error(
    "IO error while erasing chunks in {}: {source} ({confirmed} chunk entries were deleted before the failure)",
    path.display()
)]
pub struct EraseError {
    pub path: PathBuf,
    /// Entries zeroed before the failure, in this and in earlier files.
    pub confirmed: usize,
    #[source]
    pub source: io::Error,
}

/// A region file opened for writing. It is synced when dropped, so every exit path, including
/// `?` on an error, leaves the bytes written so far on disk.
struct OpenRegion {
    region: RegionFile<File>,
    path: PathBuf,
    synced: bool,
}

impl OpenRegion {
    fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self {
            region: RegionFile::new(file),
            path: path.to_path_buf(),
            synced: false,
        })
    }

    /// Syncs and closes the file.
    fn close(mut self) -> io::Result<()> {
        self.synced = true;
        self.region.get_ref().sync_all()
    }
}

impl Drop for OpenRegion {
    fn drop(&mut self) {
        if self.synced {
            return;
        }
        if let Err(e) = self.region.get_ref().sync_all() {
            warn!(
                "Failed to close region file {} cleanly: {e}",
                self.path.display()
            );
        }
    }
}

/// Groups chunks by the region file holding them, in a stable order.
pub fn partition_by_region(chunks: &HashSet<ChunkPos>) -> BTreeMap<RegionPos, Vec<ChunkPos>> {
    let mut regions: BTreeMap<RegionPos, Vec<ChunkPos>> = BTreeMap::new();
    for chunk in chunks {
        regions.entry(chunk.region()).or_default().push(*chunk);
    }
    for chunks in regions.values_mut() {
        chunks.sort();
    }
    regions
}

/// Deletes every chunk of `worklist` from the region files in `dir`.
///
/// Missing region files are skipped, their chunks are already gone. The first I/O error stops
/// the pass; files finished before it stay deleted and are reported in `EraseError::confirmed`.
pub fn erase_chunks(
    dir: &Path,
    extension: &str,
    worklist: &HashSet<ChunkPos>,
) -> Result<EraseReport, EraseError> {
    info!("Operating on region files in: {}", dir.display());

    let mut report = EraseReport::default();
    for (region, chunks) in partition_by_region(worklist) {
        let path = dir.join(region.file_name(extension));
        if !path.exists() {
            debug!(
                "Region file {} does not exist, skipping {} chunks",
                path.display(),
                chunks.len()
            );
            report.missing_files += 1;
            continue;
        }

        erase_in_file(&path, &chunks, &mut report).map_err(|source| {
            warn!("IO error during chunk deletion in {}: {source}", path.display());
            EraseError {
                path: path.clone(),
                confirmed: report.deleted,
                source,
            }
        })?;
        report.files_processed += 1;
        info!("Processed {} chunks in {}", chunks.len(), path.display());
    }

    Ok(report)
}

fn erase_in_file(path: &Path, chunks: &[ChunkPos], report: &mut EraseReport) -> io::Result<()> {
    let mut open = OpenRegion::open(path)?;

    for chunk in chunks {
        let slot = chunk.header_index();
        let entry = open.region.read_location(slot)?;

        if entry.is_absent() {
            debug!("Chunk {chunk} already empty in {}", path.display());
            report.already_absent += 1;
            continue;
        }
        if let Err(e) = entry.validate(slot) {
            warn!("Leaving chunk {chunk} in {} untouched: {e}", path.display());
            report.corrupt += 1;
            continue;
        }

        open.region.clear_slot(slot, entry)?;
        report.deleted += 1;
        debug!("Deleted chunk {chunk} from region file {}", path.display());
    }

    open.close()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::region_parser::region::{testing::*, LocationEntry};
    use tempfile::tempdir;

    fn worklist(chunks: &[(i32, i32)]) -> HashSet<ChunkPos> {
        chunks.iter().map(|&(x, z)| ChunkPos::new(x, z)).collect()
    }

    #[test]
    fn test_erase_single_chunk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.0.0.mca");
        let mut data = region_image(4);
        set_location(&mut data, 33, LocationEntry::new(3, 2));
        set_timestamp(&mut data, 33, 1_700_000_000);
        set_location(&mut data, 0, LocationEntry::new(2, 1));
        set_timestamp(&mut data, 0, 1_700_000_001);
        fs::write(&path, data).unwrap();

        let report = erase_chunks(dir.path(), "mca", &worklist(&[(1, 1)])).unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(report.files_processed, 1);

        let data = fs::read(&path).unwrap();
        assert!(data[3 * 4096..5 * 4096].iter().all(|&b| b == 0));
        assert_eq!(&data[33 * 4..33 * 4 + 4], &[0, 0, 0, 0]);
        assert_eq!(&data[4096 + 33 * 4..4096 + 33 * 4 + 4], &[0, 0, 0, 0]);

        // Untouched neighbour
        assert!(data[2 * 4096..3 * 4096].iter().all(|&b| b == 0xAB));
        assert_eq!(&data[0..4], &LocationEntry::new(2, 1).raw().to_be_bytes());
        assert_eq!(&data[4096..4100], &1_700_000_001u32.to_be_bytes());
    }

    #[test]
    fn test_erase_twice_deletes_nothing_the_second_time() {
        let dir = tempdir().unwrap();
        let mut data = region_image(3);
        set_location(&mut data, 0, LocationEntry::new(2, 1));
        set_location(&mut data, 1, LocationEntry::new(3, 2));
        fs::write(dir.path().join("r.0.0.mca"), data).unwrap();
        let chunks = worklist(&[(0, 0), (1, 0)]);

        let first = erase_chunks(dir.path(), "mca", &chunks).unwrap();
        assert_eq!(first.deleted, 2);

        let second = erase_chunks(dir.path(), "mca", &chunks).unwrap();
        assert_eq!(second.deleted, 0);
        assert_eq!(second.already_absent, 2);
    }

    #[test]
    fn test_erase_skips_missing_files_and_corrupt_entries() {
        let dir = tempdir().unwrap();
        let mut data = region_image(1);
        set_location(&mut data, 0, LocationEntry::new(2, 0));
        fs::write(dir.path().join("r.0.0.mca"), &data).unwrap();

        let report = erase_chunks(dir.path(), "mca", &worklist(&[(0, 0), (40, 40)])).unwrap();
        assert_eq!(report.deleted, 0);
        assert_eq!(report.corrupt, 1);
        assert_eq!(report.missing_files, 1);
        assert_eq!(fs::read(dir.path().join("r.0.0.mca")).unwrap(), data);
    }

    #[test]
    fn test_erase_reports_confirmed_count_on_failure() {
        let dir = tempdir().unwrap();
        let mut good = region_image(1);
        set_location(&mut good, 0, LocationEntry::new(2, 1));
        fs::write(dir.path().join("r.0.0.mca"), good).unwrap();
        // Too short to even hold the slot being read.
        fs::write(dir.path().join("r.1.0.mca"), vec![0u8; 16]).unwrap();

        let err = erase_chunks(dir.path(), "mca", &worklist(&[(0, 0), (32 + 31, 31)])).unwrap_err();
        assert_eq!(err.confirmed, 1);
        assert_eq!(err.source.kind(), io::ErrorKind::UnexpectedEof);
        assert!(err.path.ends_with("r.1.0.mca"));

        let data = fs::read(dir.path().join("r.0.0.mca")).unwrap();
        assert_eq!(&data[0..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_partition_by_region() {
        let regions = partition_by_region(&worklist(&[(0, 0), (31, 31), (32, 0), (-1, 0)]));
        let keys: Vec<_> = regions.keys().copied().collect();
        assert_eq!(
            keys,
            vec![RegionPos::new(-1, 0), RegionPos::new(0, 0), RegionPos::new(1, 0)]
        );
        assert_eq!(regions[&RegionPos::new(0, 0)].len(), 2);
    }
}
