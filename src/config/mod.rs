//! Run configuration.
//!
//! Settings are read from a JSON document (or YAML, when the file ends in
//! `.yaml`/`.yml`) and turned into a validated [`RunSettings`] with every
//! path resolved.
//!
//! ## Document
//!
//! ```json
//! {
//!     "root_dir": "..",
//!     "template_dir": "templates",
//!     "output_dir": "Source",
//!     "included_suffixes": ["*.tmpl"],
//!
//!     "stencil_dir_name": "_stencils",
//!     "create_directories": false,
//!     "global_namespace": {"product": "squeezer"},
//!     "engine_options": {"trim_blocks": true},
//!     "engine_extensions": ["case"],
//!     "custom_modules": ["include_guard"],
//!     "last_run_file": ".last_run",
//!     "marker_new_file": "### New file:",
//!     "marker_content": "### Content:",
//!     "newline": "native",
//!     "post_commands": []
//! }
//! ```
//!
//! `root_dir` is relative to the directory holding the document; every other
//! path is relative to `root_dir`. Unknown keys are rejected to catch typos
//! early.

mod namespace;
mod newline;

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::engine::EngineOptions;
use crate::error::{Result, TgenError};
use crate::render::Markers;

pub use namespace::{merge, GlobalOverride, Namespace};
pub use newline::Newline;

/// Serialization format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// YAML for `.yaml`/`.yml` files, JSON for everything else.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                DocumentFormat::Yaml
            }
            _ => DocumentFormat::Json,
        }
    }

    /// Parse `content`; `path` is only used in error messages.
    pub fn parse<T: DeserializeOwned>(&self, content: &str, path: &Path) -> Result<T> {
        let parsed = match self {
            DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        };

        parsed.map_err(|message| TgenError::Configuration {
            message: format!("Invalid document {}: {}", path.display(), message),
            help: Some("Check the document syntax and key names".to_string()),
        })
    }
}

/// The configuration document as written by the user.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsDocument {
    pub root_dir: PathBuf,
    pub template_dir: PathBuf,
    pub output_dir: PathBuf,
    pub included_suffixes: Vec<String>,

    #[serde(default)]
    pub stencil_dir_name: String,

    #[serde(default)]
    pub create_directories: bool,

    #[serde(default)]
    pub global_namespace: Namespace,

    #[serde(default)]
    pub engine_options: EngineOptions,

    #[serde(default)]
    pub engine_extensions: Vec<String>,

    #[serde(default)]
    pub custom_modules: Vec<String>,

    #[serde(default = "default_last_run_file")]
    pub last_run_file: PathBuf,

    #[serde(default = "default_marker_new_file")]
    pub marker_new_file: String,

    #[serde(default = "default_marker_content")]
    pub marker_content: String,

    #[serde(default = "default_newline")]
    pub newline: String,

    /// Shell commands run from the root directory after a run that
    /// rendered at least one template.
    #[serde(default)]
    pub post_commands: Vec<String>,
}

fn default_last_run_file() -> PathBuf {
    PathBuf::from(".last_run")
}

fn default_marker_new_file() -> String {
    "### New file:".to_string()
}

fn default_marker_content() -> String {
    "### Content:".to_string()
}

fn default_newline() -> String {
    "native".to_string()
}

impl SettingsDocument {
    /// Parse a document in the given format.
    pub fn parse(content: &str, format: DocumentFormat, path: &Path) -> Result<Self> {
        format.parse(content, path)
    }
}

/// Validated settings for one run. Every path is absolute.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub root_dir: PathBuf,
    pub template_dir: PathBuf,
    pub output_dir: PathBuf,
    pub included_suffixes: Vec<String>,
    pub included_patterns: Vec<Pattern>,
    pub stencil_dir_name: String,
    pub create_directories: bool,
    pub global_namespace: Namespace,
    pub engine_options: EngineOptions,
    pub engine_extensions: Vec<String>,
    pub custom_modules: Vec<String>,
    pub last_run_file: PathBuf,
    pub markers: Markers,
    pub newline: Newline,
    pub post_commands: Vec<String>,
}

impl RunSettings {
    /// Load settings from a configuration document.
    ///
    /// Creates the template and output directories if they are missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(TgenError::Configuration {
                message: format!("Configuration file {} not found", path.display()),
                help: Some("Pass the path to a JSON or YAML settings document".to_string()),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| {
            TgenError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let document = SettingsDocument::parse(&content, DocumentFormat::for_path(path), path)?;

        let absolute = fs::canonicalize(path).map_err(|e| {
            TgenError::config(format!("Failed to resolve {}: {}", path.display(), e))
        })?;
        let anchor = absolute.parent().unwrap_or(Path::new("/"));

        Self::from_document(document, anchor)
    }

    /// Validate a parsed document. `anchor` is the directory `root_dir` is
    /// resolved against.
    pub fn from_document(document: SettingsDocument, anchor: &Path) -> Result<Self> {
        let root_dir = resolve(anchor, &document.root_dir);
        let template_dir = resolve(&root_dir, &document.template_dir);
        let output_dir = resolve(&root_dir, &document.output_dir);
        let last_run_file = resolve(&root_dir, &document.last_run_file);

        let included_patterns = compile_patterns(&document.included_suffixes)?;

        let newline = Newline::parse(&document.newline).ok_or_else(|| TgenError::Configuration {
            message: format!("Unknown newline style \"{}\"", document.newline),
            help: Some("Use \"lf\", \"crlf\" or \"native\"".to_string()),
        })?;

        let markers = Markers::new(&document.marker_new_file, &document.marker_content);
        markers.validate().map_err(TgenError::config)?;

        if document.stencil_dir_name.contains(&['/', '\\'][..]) {
            return Err(TgenError::config(format!(
                "Stencil directory name \"{}\" must be a single path segment",
                document.stencil_dir_name
            )));
        }

        ensure_directory(&root_dir, "Root")?;
        ensure_directory(&template_dir, "Template")?;
        ensure_directory(&output_dir, "Output")?;

        Ok(Self {
            root_dir,
            template_dir,
            output_dir,
            included_suffixes: document.included_suffixes,
            included_patterns,
            stencil_dir_name: document.stencil_dir_name,
            create_directories: document.create_directories,
            global_namespace: document.global_namespace,
            engine_options: document.engine_options,
            engine_extensions: document.engine_extensions,
            custom_modules: document.custom_modules,
            last_run_file,
            markers,
            newline,
            post_commands: document.post_commands,
        })
    }

    /// The stencil directory name, if stencils are enabled.
    pub fn stencil_dir_name(&self) -> Option<&str> {
        if self.stencil_dir_name.is_empty() {
            None
        } else {
            Some(&self.stencil_dir_name)
        }
    }
}

/// `path` if absolute, otherwise `base/path`, with `.` segments removed.
fn resolve(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    joined.components().collect()
}

/// Compile inclusion patterns; an invalid pattern is a configuration error.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    if patterns.is_empty() {
        return Err(TgenError::Configuration {
            message: "`included_suffixes` is empty, so no template would ever match".to_string(),
            help: Some("Add a glob pattern such as \"*.tmpl\"".to_string()),
        });
    }

    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| {
                TgenError::config(format!("Invalid pattern \"{}\" in `included_suffixes`: {}", p, e))
            })
        })
        .collect()
}

/// Create `dir` (and its parents) if missing; fail if it is not a directory.
fn ensure_directory(dir: &Path, label: &str) -> Result<()> {
    if dir.exists() {
        if dir.is_dir() {
            return Ok(());
        }
        return Err(TgenError::config(format!(
            "{} directory {} is a file",
            label,
            dir.display()
        )));
    }

    fs::create_dir_all(dir).map_err(|e| TgenError::Io {
        path: dir.to_path_buf(),
        message: format!("Failed to create {} directory: {}", label.to_lowercase(), e),
    })
}
