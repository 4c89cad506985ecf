//! Reading and destructively editing region files at the header and sector level.
//!
//! Chunk payloads are never decoded: scanning only reads location tables, erasing only zeroes
//! sectors and header slots.

pub mod chunk;
pub mod eraser;
pub mod region;
pub mod scanner;

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("Malformed region file name: {0}")]
    MalformedFilename(String),

    #[error("Corrupt chunk entry in header slot {slot} (raw 0x{raw:08x})")]
    CorruptChunkEntry { slot: usize, raw: u32 },

    #[error("Region file {} has a truncated header ({len} bytes)", path.display())]
    TruncatedHeader { path: PathBuf, len: u64 },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RegionError {
    /// Wraps an `io::Error` with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RegionError::Io {
            path: path.into(),
            source,
        }
    }
}
