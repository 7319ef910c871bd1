//! Deterministic, filtered directory traversal.
//!
//! Entries are sorted by name at every level, so the same tree always
//! produces the same sequence regardless of platform or filesystem order.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use glob::Pattern;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Errors raised while walking a directory tree.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("failed to read modification time of {}: {source}", path.display())]
    Metadata { path: PathBuf, source: io::Error },
}

/// Options controlling a walk.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Emit a level's subdirectory contents before the level's own files.
    pub directories_first: bool,
    /// Include directory paths themselves (each before its contents).
    pub include_directories: bool,
    /// Follow symlinks. When off, symlinked files and directories are
    /// skipped.
    pub follow_symlinks: bool,
    /// File-name glob patterns; a file must match at least one.
    pub patterns: Vec<Pattern>,
    /// Directory names that are pruned together with their contents.
    pub excluded_dirs: BTreeSet<String>,
    /// File names that are never returned.
    pub excluded_files: BTreeSet<String>,
    /// Only return files whose modification time (whole seconds, rounded
    /// up) is at or after this Unix timestamp.
    pub modified_after: Option<u64>,
}

impl WalkOptions {
    /// Options that match files against `patterns`.
    pub fn matching(patterns: Vec<Pattern>) -> Self {
        Self {
            patterns,
            ..Default::default()
        }
    }

    fn matches_file(&self, name: &str) -> bool {
        !self.excluded_files.contains(name) && self.patterns.iter().any(|p| p.matches(name))
    }
}

/// Walk `root` depth-first and return the selected paths in a stable order.
///
/// `root` itself is never part of the result.
pub fn walk(root: &Path, options: &WalkOptions) -> Result<Vec<PathBuf>, WalkError> {
    let directories_first = options.directories_first;
    let mut result = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(options.follow_symlinks)
        .sort_by(move |a, b| compare_entries(a, b, directories_first))
        .into_iter()
        .filter_entry(|entry| !is_excluded_dir(entry, &options.excluded_dirs));

    for entry in walker {
        let entry = entry.map_err(|e| WalkError::Read {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e,
        })?;

        if entry.file_type().is_dir() {
            if options.include_directories {
                result.push(entry.into_path());
            }
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !options.matches_file(&name) {
            continue;
        }

        if let Some(cutoff) = options.modified_after {
            let mtime = modified_time(entry.path()).map_err(|e| WalkError::Metadata {
                path: entry.path().to_path_buf(),
                source: e,
            })?;
            if mtime < cutoff {
                continue;
            }
        }

        result.push(entry.into_path());
    }

    Ok(result)
}

/// Modification time of `path` in whole seconds since the Unix epoch.
///
/// Symlinks are followed. Any sub-second part rounds the value up, so
/// filesystems with coarse timestamps never make a file look older than a
/// watermark taken in the same second.
pub fn modified_time(path: &Path) -> io::Result<u64> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(ceil_seconds(modified))
}

fn ceil_seconds(time: SystemTime) -> u64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) if d.subsec_nanos() > 0 => d.as_secs() + 1,
        Ok(d) => d.as_secs(),
        Err(_) => 0,
    }
}

fn compare_entries(a: &DirEntry, b: &DirEntry, directories_first: bool) -> Ordering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();

    let group = if directories_first {
        b_dir.cmp(&a_dir)
    } else {
        a_dir.cmp(&b_dir)
    };

    group.then_with(|| a.file_name().cmp(b.file_name()))
}

fn is_excluded_dir(entry: &DirEntry, excluded: &BTreeSet<String>) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && excluded.contains(entry.file_name().to_string_lossy().as_ref())
}
