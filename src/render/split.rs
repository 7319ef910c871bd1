//! Splitting rendered text into output files.
//!
//! A rendered template is a sequence of file sections:
//!
//! ```text
//! ### New file: dsp/gain.h
//! ### Content:
//! #pragma once
//! ...
//! ### New file: dsp/gain.cpp
//! ### Content:
//! #include "gain.h"
//! ```
//!
//! Everything here is pure; writing happens in [`super::writer`].

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// The two delimiter strings of a rendered blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub new_file: String,
    pub content: String,
}

impl Markers {
    pub fn new(new_file: &str, content: &str) -> Self {
        Self {
            new_file: new_file.to_string(),
            content: content.to_string(),
        }
    }

    /// Markers must be non-empty and must not contain one another.
    pub fn validate(&self) -> Result<(), String> {
        if self.new_file.trim().is_empty() || self.content.trim().is_empty() {
            return Err("`marker_new_file` and `marker_content` must not be empty".to_string());
        }
        if self.new_file.contains(&self.content) || self.content.contains(&self.new_file) {
            return Err(format!(
                "markers \"{}\" and \"{}\" overlap",
                self.new_file, self.content
            ));
        }
        Ok(())
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self::new("### New file:", "### Content:")
    }
}

/// One output file described by a rendered blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSection {
    /// Destination relative to the output directory.
    pub destination: PathBuf,
    pub body: String,
}

/// Ways a rendered blob can be malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("text before the first \"{marker}\" marker: {excerpt:?}")]
    LeadingText { marker: String, excerpt: String },

    #[error("file section {index} has {count} \"{marker}\" markers, expected exactly one")]
    ContentMarkerCount {
        index: usize,
        marker: String,
        count: usize,
    },

    #[error("file section {index} has no destination file name")]
    MissingDestination { index: usize },

    #[error("file section {index} destination {destination:?} spans several lines")]
    MultilineDestination { index: usize, destination: String },

    #[error("file section {index} destination {destination:?} leaves the output directory")]
    UnsafeDestination { index: usize, destination: String },
}

/// Split a rendered blob into its file sections.
///
/// The text before the first new-file marker must be blank. Blank sections
/// (a trailing marker, or two markers back to back) are skipped. Every other
/// section holds exactly one content marker; the destination is the text
/// before it (trimmed) and the body is the text after it with leading
/// whitespace removed. All sections are checked before any is returned.
pub fn split_rendered_blob(text: &str, markers: &Markers) -> Result<Vec<FileSection>, StructureError> {
    let mut fragments = text.split(markers.new_file.as_str());

    let leading = fragments.next().unwrap_or_default();
    if !leading.trim().is_empty() {
        return Err(StructureError::LeadingText {
            marker: markers.new_file.clone(),
            excerpt: excerpt(leading.trim()),
        });
    }

    fragments
        .enumerate()
        .filter(|(_, fragment)| !fragment.trim().is_empty())
        .map(|(i, fragment)| split_fragment(i + 1, fragment, markers))
        .collect()
}

fn split_fragment(index: usize, fragment: &str, markers: &Markers) -> Result<FileSection, StructureError> {
    let count = fragment.matches(markers.content.as_str()).count();
    if count != 1 {
        return Err(StructureError::ContentMarkerCount {
            index,
            marker: markers.content.clone(),
            count,
        });
    }

    let (head, body) = fragment
        .split_once(markers.content.as_str())
        .unwrap_or((fragment, ""));

    let destination = head.trim();
    if destination.is_empty() {
        return Err(StructureError::MissingDestination { index });
    }
    if destination.contains('\n') {
        return Err(StructureError::MultilineDestination {
            index,
            destination: destination.to_string(),
        });
    }

    let path = PathBuf::from(destination.replace('\\', "/"));
    if !is_contained(&path) {
        return Err(StructureError::UnsafeDestination {
            index,
            destination: destination.to_string(),
        });
    }

    Ok(FileSection {
        destination: path,
        body: body.trim_start().to_string(),
    })
}

/// True for relative paths that cannot climb above their base.
fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn excerpt(text: &str) -> String {
    const LIMIT: usize = 40;
    match text.char_indices().nth(LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
