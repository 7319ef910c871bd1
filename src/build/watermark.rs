//! The last-run watermark file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Result, TgenError};

/// Unix timestamp (whole seconds) of the last run that rendered anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watermark {
    path: PathBuf,
}

impl Watermark {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored timestamp; `None` when missing or unreadable.
    pub fn read(&self) -> Option<u64> {
        fs::read_to_string(&self.path).ok()?.trim().parse().ok()
    }

    pub fn write(&self, timestamp: u64) -> Result<()> {
        fs::write(&self.path, timestamp.to_string()).map_err(|e| TgenError::Io {
            path: self.path.clone(),
            message: format!("Failed to write watermark: {}", e),
        })
    }
}

/// `time` as whole Unix seconds, rounded down.
pub fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
