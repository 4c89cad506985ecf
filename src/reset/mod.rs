//! The dimension reset: scan the region files, plan what is unprotected, evacuate the players
//! standing there, then erase.
//!
//! Everything before the erase step only reads, so any failure up to that point leaves the world
//! untouched.
pub mod evacuation;
pub mod planner;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio::task::JoinError;

use crate::config::{dimension_label, normalize_dimension, Settings};
use crate::consts::messages::RESTART_ADVICE;
use crate::region_parser::eraser::{erase_chunks, EraseError};
use crate::region_parser::scanner::scan_region_dir;
use crate::region_parser::RegionError;
use crate::server::{HostError, MainHandle};
use crate::zone::registry::ZoneRegistry;

#[derive(Error, Debug)]
pub enum ResetError {
    #[error("A reset of {0} is already running")]
    InProgress(String),

    #[error("Region directory not found: {}", .0.display())]
    RegionDirectoryMissing(PathBuf),

    #[error("Could not scan the region files: {0}")]
    Scan(#[from] RegionError),

    #[error(transparent)]
    Erase(#[from] EraseError),

    #[error("Could not evacuate players: {0}")]
    Host(#[from] HostError),

    #[error("Background worker failed: {0}")]
    Worker(#[from] JoinError),
}

impl ResetError {
    /// Chunk entries deleted before the failure. Only an erase failure can have any.
    pub fn confirmed_deletions(&self) -> usize {
        match self {
            Self::Erase(e) => e.confirmed,
            _ => 0,
        }
    }

    /// Feedback lines for whoever started the failed reset.
    pub fn feedback(&self) -> Vec<String> {
        let mut lines = vec![match self {
            Self::Erase(_) => format!("Failed to delete chunks: {self}. Check logs."),
            _ => self.to_string(),
        }];
        if self.confirmed_deletions() > 0 {
            lines.push(RESTART_ADVICE.to_string());
        }
        lines
    }
}

/// Outcome of a completed reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetReport {
    pub dimension: String,
    pub region_dir: PathBuf,
    pub files_scanned: usize,
    /// Chunks found in the region files.
    pub existing: usize,
    /// Chunks outside every zone.
    pub planned: usize,
    /// Players whose disconnect the main loop confirmed.
    pub evacuated: Vec<String>,
    pub deleted: usize,
    pub already_absent: usize,
    pub corrupt: usize,
}

impl ResetReport {
    /// Feedback lines for whoever started the reset.
    pub fn feedback(&self) -> Vec<String> {
        let label = dimension_label(&self.dimension);
        let mut lines = Vec::new();

        if self.existing == 0 {
            lines.push(format!("No chunk entries found in region files for {label}."));
        } else {
            lines.push(format!(
                "Found {} existing chunk entries in {label}.",
                self.existing
            ));
        }

        if self.planned == 0 {
            lines.push(format!("No unprotected chunks to delete in {label}."));
            return lines;
        }
        lines.push(format!(
            "Identified {} unprotected chunks to delete.",
            self.planned
        ));

        if !self.evacuated.is_empty() {
            lines.push(format!(
                "Disconnected players from deletion zones: {}",
                self.evacuated.join(", ")
            ));
        }
        lines.push(format!(
            "Successfully processed {} chunk entries for deletion in {label}.",
            self.deleted
        ));
        if self.already_absent > 0 || self.corrupt > 0 {
            lines.push(format!(
                "{} were already absent, {} were left untouched as corrupt.",
                self.already_absent, self.corrupt
            ));
        }
        if self.deleted > 0 {
            lines.push(RESTART_ADVICE.to_string());
        }
        lines
    }
}

/// Marks a dimension as being reset until dropped.
struct InFlight<'a> {
    dimensions: &'a Mutex<HashSet<String>>,
    dimension: String,
}

impl<'a> InFlight<'a> {
    fn acquire(dimensions: &'a Mutex<HashSet<String>>, dimension: &str) -> Option<Self> {
        if !dimensions.lock().insert(dimension.to_string()) {
            return None;
        }
        Some(Self {
            dimensions,
            dimension: dimension.to_string(),
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.dimensions.lock().remove(&self.dimension);
    }
}

/// Runs dimension resets. Shared behind an `Arc` so each reset can run on its own task.
pub struct ResetPipeline {
    settings: Settings,
    registry: Arc<RwLock<ZoneRegistry>>,
    host: MainHandle,
    in_flight: Mutex<HashSet<String>>,
}

impl ResetPipeline {
    pub fn new(settings: Settings, registry: Arc<RwLock<ZoneRegistry>>, host: MainHandle) -> Self {
        Self {
            settings,
            registry,
            host,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Whether any dimension is being reset right now.
    pub fn is_running(&self) -> bool {
        !self.in_flight.lock().is_empty()
    }

    /// Deletes every chunk of `dimension` that no zone protects.
    ///
    /// Players standing in doomed chunks are disconnected first, and the erase only starts once
    /// the main loop confirmed it. The zones themselves are kept.
    pub async fn run(&self, dimension: &str) -> Result<ResetReport, ResetError> {
        let dimension = normalize_dimension(dimension);
        let _guard = InFlight::acquire(&self.in_flight, &dimension)
            .ok_or_else(|| ResetError::InProgress(dimension.clone()))?;

        let region_dir = self.settings.region_dir(&dimension);
        info!(
            "Starting dimension reset for {}, scanning region files in: {}",
            dimension_label(&dimension),
            region_dir.display()
        );
        if !region_dir.is_dir() {
            return Err(ResetError::RegionDirectoryMissing(region_dir));
        }

        let extension = self.settings.region_extension.clone();
        let scan = {
            let dir = region_dir.clone();
            let extension = extension.clone();
            tokio::task::spawn_blocking(move || scan_region_dir(&dir, &extension)).await??
        };
        if scan.corrupt_entries > 0 {
            warn!(
                "{} corrupt chunk entries in {} will be neither protected nor deleted",
                scan.corrupt_entries,
                region_dir.display()
            );
        }

        let worklist = {
            let registry = self.registry.read();
            planner::plan(&registry, &dimension, &scan.chunks)
        };
        info!(
            "Found {} existing chunks, {} of them are unprotected",
            scan.chunks.len(),
            worklist.len()
        );

        let mut report = ResetReport {
            dimension: dimension.clone(),
            region_dir: region_dir.clone(),
            files_scanned: scan.files_scanned,
            existing: scan.chunks.len(),
            planned: worklist.len(),
            ..Default::default()
        };
        if worklist.is_empty() {
            return Ok(report);
        }

        report.evacuated = evacuation::evacuate(&self.host, &dimension, &worklist).await?;

        info!("Attempting to delete {} chunks...", worklist.len());
        let erased = {
            let dir = region_dir.clone();
            tokio::task::spawn_blocking(move || erase_chunks(&dir, &extension, &worklist)).await??
        };
        report.deleted = erased.deleted;
        report.already_absent = erased.already_absent;
        report.corrupt = erased.corrupt;

        info!(
            "Reset of {} done: {} chunk entries deleted",
            dimension, report.deleted
        );
        Ok(report)
    }
}
