//! Engine extensions: general-purpose filters and globals.

use serde_json::{json, Value};

use crate::config::RunSettings;
use crate::engine::{
    camel_case, debug, kebab_case, pascal_case, shouty_snake_case, snake_case, Environment,
};
use crate::error::Result;

use super::{EnvironmentExtension, ExtensionLog};

/// `case`: identifier case conversion filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseFilters;

impl EnvironmentExtension for CaseFilters {
    fn name(&self) -> &'static str {
        "case"
    }

    fn update_environment(
        &self,
        env: Environment,
        _settings: RunSettings,
        _log: &ExtensionLog<'_>,
    ) -> Result<Environment> {
        Ok(env
            .with_filter("snake_case", snake_case)
            .with_filter("pascal_case", pascal_case)
            .with_filter("camel_case", camel_case)
            .with_filter("kebab_case", kebab_case)
            .with_filter("shouty_snake_case", shouty_snake_case))
    }
}

/// `debug`: a `debug` filter plus a `debug_context` global describing the
/// loaded templates and the configured namespace keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugTools;

impl EnvironmentExtension for DebugTools {
    fn name(&self) -> &'static str {
        "debug"
    }

    fn update_environment(
        &self,
        env: Environment,
        settings: RunSettings,
        log: &ExtensionLog<'_>,
    ) -> Result<Environment> {
        let names = |list: &[crate::discovery::TemplatePath]| -> Value {
            list.iter().map(|t| Value::String(t.name.clone())).collect()
        };
        let context = json!({
            "templates": names(env.templates()),
            "stencils": names(env.stencils()),
            "namespace_keys": settings.global_namespace.keys().collect::<Vec<_>>(),
        });

        log.debug(&format!(
            "{} templates, {} stencils",
            env.templates().len(),
            env.stencils().len()
        ));

        env.with_filter("debug", debug)
            .with_global("debug_context", context)
    }
}
