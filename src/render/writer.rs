//! Writing file sections below the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{Newline, RunSettings};
use crate::error::{Result, TgenError};
use crate::report::Reporter;

use super::split::FileSection;

/// Suffix of files that get the owner-execute bit.
const EXECUTABLE_SUFFIX: &str = "sh";

/// Write every section and return the number of files saved.
///
/// Parent directories are checked (or created) for all sections before the
/// first file is written.
pub fn write_sections(
    sections: &[FileSection],
    settings: &RunSettings,
    reporter: &mut Reporter,
) -> Result<usize> {
    let targets: Vec<PathBuf> = sections
        .iter()
        .map(|s| settings.output_dir.join(&s.destination))
        .collect();

    for target in &targets {
        if let Some(parent) = target.parent() {
            prepare_directory(parent, settings.create_directories, reporter)?;
        }
    }

    for (section, target) in sections.iter().zip(&targets) {
        write_file(target, &section.body, settings.newline)?;
        reporter.file_saved(target);
    }

    Ok(targets.len())
}

fn prepare_directory(dir: &Path, create: bool, reporter: &Reporter) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    if !create {
        return Err(TgenError::MissingOutputDirectory {
            dir: dir.to_path_buf(),
        });
    }

    fs::create_dir_all(dir).map_err(|e| TgenError::Io {
        path: dir.to_path_buf(),
        message: format!("Failed to create directory: {}", e),
    })?;
    reporter.directory_created(dir);
    Ok(())
}

/// Write `body` to `path` with the newline style its suffix calls for.
pub fn write_file(path: &Path, body: &str, default_newline: Newline) -> Result<()> {
    let text = Newline::for_path(path, default_newline).apply(body);

    fs::write(path, text).map_err(|e| TgenError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write file: {}", e),
    })?;

    if is_executable_script(path) {
        mark_executable(path)?;
    }
    Ok(())
}

fn is_executable_script(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(EXECUTABLE_SUFFIX))
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let to_io = |e: std::io::Error| TgenError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to set permissions: {}", e),
    };

    let mut permissions = fs::metadata(path).map_err(to_io)?.permissions();
    permissions.set_mode(permissions.mode() | 0o100);
    fs::set_permissions(path, permissions).map_err(to_io)
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}
