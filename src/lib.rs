//! tgen - template-driven source generator
//!
//! A library for rendering a directory tree of templates into a directory
//! tree of generated files. One template may describe several output files;
//! shared includes ("stencils") live in dedicated directories; and runs can
//! be restricted to templates changed since the previous run.

pub mod build;
pub mod cli;
pub mod command;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod extensions;
pub mod output;
pub mod render;
pub mod report;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use build::{Generator, Watermark};
pub use config::{GlobalOverride, Namespace, Newline, RunSettings};
pub use discovery::{discover, walk, TemplatePath, TemplateSet, WalkOptions};
pub use engine::{EngineOptions, Environment};
pub use error::{Result, TgenError};
pub use extensions::{EnvironmentExtension, ExtensionLog};
pub use render::{split_rendered_blob, FileSection, Markers, StructureError};
pub use report::{Reporter, RunStats, Verbosity};
