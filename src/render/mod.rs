//! Rendering one template into one or more output files.
//!
//! A template renders to a blob of text which [`split_rendered_blob`] cuts
//! into file sections; [`write_sections`] then saves them below the output
//! directory. Nothing is written unless the whole blob is well formed.

mod split;
mod writer;

pub use split::{split_rendered_blob, FileSection, Markers, StructureError};
pub use writer::{write_file, write_sections};

use crate::config::{merge, Namespace, RunSettings};
use crate::engine::Environment;
use crate::error::{Result, TgenError};
use crate::report::{Reporter, RunStats};

/// Render template `name` and write every file it describes.
///
/// `overrides`, when given, is merged on top of the configured global
/// namespace for this render only.
pub fn render_template(
    env: &Environment,
    settings: &RunSettings,
    reporter: &mut Reporter,
    name: &str,
    overrides: Option<&Namespace>,
) -> Result<RunStats> {
    let namespace = match overrides {
        Some(overrides) => merge(&settings.global_namespace, overrides),
        None => settings.global_namespace.clone(),
    };

    reporter.template_started(name);

    let text = env.render(name, &namespace)?;
    let sections =
        split_rendered_blob(&text, &settings.markers).map_err(|e| TgenError::OutputStructure {
            template: name.to_string(),
            message: e.to_string(),
        })?;

    let files_saved = write_sections(&sections, settings, reporter)?;

    Ok(RunStats {
        templates_processed: 1,
        files_saved,
    })
}
