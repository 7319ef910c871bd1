//! Extensions that customise the template environment.
//!
//! Extensions come from a static registry and are selected by identifier in
//! the settings: `engine_extensions` first, then `custom_modules`. Each one
//! consumes the current [`Environment`] and returns a new one, so applying
//! them is a left fold over the configured list.

mod custom;
mod engine;

use std::collections::BTreeSet;
use std::fmt;

use crate::config::RunSettings;
use crate::engine::Environment;
use crate::error::{Result, TgenError};
use crate::report::Reporter;

pub use custom::{BuildInfo, IdentifierTests, IncludeGuard};
pub use engine::{CaseFilters, DebugTools};

/// A named transformation of the template environment.
pub trait EnvironmentExtension {
    /// Identifier used in the settings document.
    fn name(&self) -> &'static str;

    /// Return an updated environment.
    ///
    /// `settings` is a private copy; changing it has no effect on the run.
    fn update_environment(
        &self,
        env: Environment,
        settings: RunSettings,
        log: &ExtensionLog<'_>,
    ) -> Result<Environment>;
}

/// Where an extension identifier was listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    Engine,
    Custom,
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionKind::Engine => write!(f, "engine extension"),
            ExtensionKind::Custom => write!(f, "custom module"),
        }
    }
}

/// Debug and error output for one extension, routed through the run's
/// reporter.
pub struct ExtensionLog<'a> {
    reporter: &'a Reporter,
    name: &'a str,
}

impl<'a> ExtensionLog<'a> {
    pub fn new(reporter: &'a Reporter, name: &'a str) -> Self {
        Self { reporter, name }
    }

    /// Shown at high verbosity only.
    pub fn debug(&self, message: &str) {
        self.reporter.debug(&format!("[{}] {}", self.name, message));
    }

    /// Always shown.
    pub fn error(&self, message: &str) {
        self.reporter.error(&format!("[{}] {}", self.name, message));
    }
}

/// Identifiers accepted in `engine_extensions`.
pub const ENGINE_EXTENSIONS: &[&str] = &["case", "debug"];

/// Identifiers accepted in `custom_modules`.
pub const CUSTOM_MODULES: &[&str] = &["build_info", "identifier_tests", "include_guard"];

/// Look up a registered extension.
pub fn lookup(kind: ExtensionKind, id: &str) -> Option<Box<dyn EnvironmentExtension>> {
    match (kind, id) {
        (ExtensionKind::Engine, "case") => Some(Box::new(CaseFilters)),
        (ExtensionKind::Engine, "debug") => Some(Box::new(DebugTools)),
        (ExtensionKind::Custom, "build_info") => Some(Box::new(BuildInfo)),
        (ExtensionKind::Custom, "identifier_tests") => Some(Box::new(IdentifierTests)),
        (ExtensionKind::Custom, "include_guard") => Some(Box::new(IncludeGuard)),
        _ => None,
    }
}

/// Apply every configured extension to `env`, in order.
///
/// An unknown identifier or a failing extension aborts with
/// [`TgenError::Extension`]; no partially updated environment escapes.
pub fn apply_extensions(
    env: Environment,
    settings: &RunSettings,
    reporter: &Reporter,
) -> Result<Environment> {
    let engine = settings
        .engine_extensions
        .iter()
        .map(|id| (ExtensionKind::Engine, id));
    let custom = settings
        .custom_modules
        .iter()
        .map(|id| (ExtensionKind::Custom, id));

    engine.chain(custom).try_fold(env, |env, (kind, id)| {
        let extension = lookup(kind, id).ok_or_else(|| unknown_extension(kind, id))?;
        apply_one(extension.as_ref(), env, settings, reporter)
    })
}

fn apply_one(
    extension: &dyn EnvironmentExtension,
    env: Environment,
    settings: &RunSettings,
    reporter: &Reporter,
) -> Result<Environment> {
    let name = extension.name();
    let log = ExtensionLog::new(reporter, name);

    let filters_before = names(env.filter_names());
    let functions_before = names(env.function_names());
    let testers_before = names(env.tester_names());

    log.debug("updating environment");
    let env = extension
        .update_environment(env, settings.clone(), &log)
        .map_err(|e| match e {
            TgenError::Extension { .. } => e,
            other => TgenError::Extension {
                name: name.to_string(),
                message: other.to_string(),
            },
        })?;

    log_added(&log, "filter", &filters_before, env.filter_names());
    log_added(&log, "function", &functions_before, env.function_names());
    log_added(&log, "test", &testers_before, env.tester_names());
    Ok(env)
}

fn unknown_extension(kind: ExtensionKind, id: &str) -> TgenError {
    let known = match kind {
        ExtensionKind::Engine => ENGINE_EXTENSIONS,
        ExtensionKind::Custom => CUSTOM_MODULES,
    };
    TgenError::Extension {
        name: id.to_string(),
        message: format!("unknown {} (known: {})", kind, known.join(", ")),
    }
}

fn names<'a>(iter: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    iter.map(str::to_string).collect()
}

fn log_added<'a>(
    log: &ExtensionLog<'_>,
    label: &str,
    before: &BTreeSet<String>,
    after: impl Iterator<Item = &'a str>,
) {
    let added: Vec<String> = after
        .filter(|name| !before.contains(*name))
        .map(|name| format!("\"{}\"", name))
        .collect();
    if !added.is_empty() {
        log.debug(&format!(
            "added {}: {}",
            crate::output::plural(added.len(), label, &format!("{}s", label)),
            added.join(", ")
        ));
    }
}
