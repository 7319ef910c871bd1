//! Template discovery for tgen projects.
//!
//! Finds every template under the template directory and classifies it as
//! a renderable template or a stencil (a shared include that is never
//! rendered on its own).
//!
//! # Example
//!
//! ```ignore
//! use tgen::discovery::discover;
//!
//! let set = discover(&settings)?;
//! println!("Found {} templates", set.templates.len());
//! ```

pub mod walker;

use std::path::{Component, Path, PathBuf};

use glob::Pattern;

use crate::config::RunSettings;
use crate::error::{Result, TgenError};

pub use walker::{modified_time, walk, WalkError, WalkOptions};

/// Whether a template file is rendered directly or only included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Template,
    Stencil,
}

/// A file below the template directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePath {
    /// Path relative to the template directory with `/` separators. This is
    /// also the name the engine knows the template by.
    pub name: String,
    /// Absolute location on disk.
    pub path: PathBuf,
    pub kind: TemplateKind,
}

impl TemplatePath {
    /// Build a template path for `path`, which must live below `template_dir`.
    pub fn new(template_dir: &Path, path: &Path, stencil_dir_name: &str) -> Self {
        let name = template_name(template_dir, path);
        let kind = if is_stencil(&name, stencil_dir_name) {
            TemplateKind::Stencil
        } else {
            TemplateKind::Template
        };

        Self {
            name,
            path: path.to_path_buf(),
            kind,
        }
    }

    pub fn is_stencil(&self) -> bool {
        self.kind == TemplateKind::Stencil
    }
}

/// Templates found in one discovery pass.
#[derive(Debug, Default)]
pub struct TemplateSet {
    /// Renderable templates, in walk order.
    pub templates: Vec<TemplatePath>,
    /// Stencils, in walk order.
    pub stencils: Vec<TemplatePath>,
}

/// `path` relative to `template_dir`, joined with `/` on every platform.
pub fn template_name(template_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(template_dir).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// True if any segment of `name` equals `stencil_dir_name`.
///
/// An empty stencil directory name disables stencils.
pub fn is_stencil(name: &str, stencil_dir_name: &str) -> bool {
    !stencil_dir_name.is_empty() && name.split('/').any(|segment| segment == stencil_dir_name)
}

/// Walk options that select renderable templates, optionally only those
/// modified at or after `modified_after`.
pub fn template_walk_options(settings: &RunSettings, modified_after: Option<u64>) -> WalkOptions {
    let mut options = WalkOptions {
        modified_after,
        ..WalkOptions::matching(settings.included_patterns.clone())
    };
    if let Some(name) = settings.stencil_dir_name() {
        options.excluded_dirs.insert(name.to_string());
    }
    options
}

/// Discover all templates and stencils below the template directory.
///
/// Renderable templates must match the configured inclusion patterns.
/// Stencils are taken whole: every file inside a stencil directory is
/// loaded so that includes can use any naming scheme.
pub fn discover(settings: &RunSettings) -> Result<TemplateSet> {
    let template_dir = &settings.template_dir;
    let stencil_name = settings.stencil_dir_name().unwrap_or("");

    let templates = walk(template_dir, &template_walk_options(settings, None))
        .map_err(walk_error)?
        .into_iter()
        .map(|path| TemplatePath::new(template_dir, &path, stencil_name))
        .collect();

    let mut set = TemplateSet {
        templates,
        stencils: Vec::new(),
    };

    if !stencil_name.is_empty() {
        let options = WalkOptions::matching(vec![match_all()]);
        set.stencils = walk(template_dir, &options)
            .map_err(walk_error)?
            .into_iter()
            .map(|path| TemplatePath::new(template_dir, &path, stencil_name))
            .filter(TemplatePath::is_stencil)
            .collect();
    }

    Ok(set)
}

/// Candidate templates for a run, in walk order.
pub fn candidates(settings: &RunSettings, modified_after: Option<u64>) -> Result<Vec<TemplatePath>> {
    let stencil_name = settings.stencil_dir_name().unwrap_or("");
    let paths = walk(
        &settings.template_dir,
        &template_walk_options(settings, modified_after),
    )
    .map_err(walk_error)?;

    Ok(paths
        .into_iter()
        .map(|path| TemplatePath::new(&settings.template_dir, &path, stencil_name))
        .collect())
}

fn match_all() -> Pattern {
    Pattern::new("*").expect("`*` is a valid glob pattern")
}

pub(crate) fn walk_error(e: WalkError) -> TgenError {
    let path = match &e {
        WalkError::Read { path, .. } | WalkError::Metadata { path, .. } => path.clone(),
    };
    TgenError::Io {
        path,
        message: e.to_string(),
    }
}
