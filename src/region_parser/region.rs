//! Typed access to the header of a region file.
//!
//! A region file starts with two 4 KiB tables of 1024 big-endian `u32` entries each:
//!
//! | bytes       | table                                             |
//! |-------------|---------------------------------------------------|
//! | 0..4096     | locations: sector offset (24 bits), count (8 bits) |
//! | 4096..8192  | timestamps                                        |
//!
//! Payload sectors of 4096 bytes follow. A location of zero means the chunk is absent.
//! Every offset computation for the format lives in this file.
use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::consts::region::{
    ENTRY_BYTES, HEADER_SECTORS, SECTOR_BYTES, SLOT_COUNT, TIMESTAMP_TABLE_OFFSET,
};

use super::RegionError;

/// One packed location entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocationEntry(u32);

impl LocationEntry {
    pub const ABSENT: Self = Self(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn new(sector_offset: u32, sector_count: u8) -> Self {
        Self((sector_offset << 8) | sector_count as u32)
    }

    pub const fn raw(&self) -> u32 {
        self.0
    }

    pub const fn is_absent(&self) -> bool {
        self.0 == 0
    }

    /// First sector of the payload, counted from the start of the file.
    pub const fn sector_offset(&self) -> u32 {
        self.0 >> 8
    }

    pub const fn sector_count(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Checks a present entry. A zero sector count, or a payload that would start inside the
    /// header tables, marks the entry as corrupt.
    pub fn validate(&self, slot: usize) -> Result<(), RegionError> {
        if self.sector_count() == 0 || self.sector_offset() < HEADER_SECTORS {
            return Err(RegionError::CorruptChunkEntry {
                slot,
                raw: self.0,
            });
        }
        Ok(())
    }

    /// Byte range of the payload sectors.
    pub fn payload_range(&self) -> (u64, u64) {
        let start = self.sector_offset() as u64 * SECTOR_BYTES;
        (start, start + self.sector_count() as u64 * SECTOR_BYTES)
    }
}

/// Byte offset of the location entry for header slot `slot`.
pub const fn location_offset(slot: usize) -> u64 {
    (slot * ENTRY_BYTES) as u64
}

/// Byte offset of the timestamp entry for header slot `slot`.
pub const fn timestamp_offset(slot: usize) -> u64 {
    location_offset(slot) + TIMESTAMP_TABLE_OFFSET
}

/// A region file over any random-access byte store.
///
/// Syncing and closing a real file is left to the owner of the store.
pub struct RegionFile<S> {
    store: S,
}

impl<S: Read + Seek> RegionFile<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the store, e.g. to sync the underlying file.
    pub fn get_ref(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Length of the store in bytes.
    pub fn len(&mut self) -> io::Result<u64> {
        self.store.seek(SeekFrom::End(0))
    }

    /// Reads the whole location table. A store shorter than the table fails with
    /// `UnexpectedEof`.
    pub fn read_locations(&mut self) -> io::Result<Vec<LocationEntry>> {
        let mut table = vec![0u8; SLOT_COUNT * ENTRY_BYTES];
        self.store.seek(SeekFrom::Start(0))?;
        self.store.read_exact(&mut table)?;

        Ok(table
            .chunks_exact(ENTRY_BYTES)
            .map(|bytes| {
                LocationEntry::from_raw(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            })
            .collect())
    }

    pub fn read_location(&mut self, slot: usize) -> io::Result<LocationEntry> {
        self.read_u32(location_offset(slot)).map(LocationEntry)
    }

    #[cfg(test)]
    pub fn read_timestamp(&mut self, slot: usize) -> io::Result<u32> {
        self.read_u32(timestamp_offset(slot))
    }

    fn read_u32(&mut self, offset: u64) -> io::Result<u32> {
        let mut buf = [0u8; ENTRY_BYTES];
        self.store.seek(SeekFrom::Start(offset))?;
        self.store.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }
}

impl<S: Read + Write + Seek> RegionFile<S> {
    pub fn write_location(&mut self, slot: usize, entry: LocationEntry) -> io::Result<()> {
        self.write_u32(location_offset(slot), entry.0)
    }

    pub fn write_timestamp(&mut self, slot: usize, timestamp: u32) -> io::Result<()> {
        self.write_u32(timestamp_offset(slot), timestamp)
    }

    /// Overwrites the payload sectors of `entry` with zeroes. The range is clamped to the current
    /// length so a dangling entry never grows the file. Returns the number of bytes zeroed.
    pub fn zero_payload(&mut self, entry: LocationEntry) -> io::Result<u64> {
        let (start, end) = entry.payload_range();
        let end = end.min(self.len()?);
        if start >= end {
            return Ok(0);
        }

        let zeroes = [0u8; SECTOR_BYTES as usize];
        self.store.seek(SeekFrom::Start(start))?;
        let mut remaining = end - start;
        while remaining > 0 {
            let n = remaining.min(SECTOR_BYTES) as usize;
            self.store.write_all(&zeroes[..n])?;
            remaining -= n as u64;
        }
        Ok(end - start)
    }

    /// Zeroes the payload, location and timestamp of one slot.
    pub fn clear_slot(&mut self, slot: usize, entry: LocationEntry) -> io::Result<()> {
        self.zero_payload(entry)?;
        self.write_location(slot, LocationEntry::ABSENT)?;
        self.write_timestamp(slot, 0)
    }

    fn write_u32(&mut self, offset: u64, value: u32) -> io::Result<()> {
        self.store.seek(SeekFrom::Start(offset))?;
        self.store.write_all(&value.to_be_bytes())
    }
}
