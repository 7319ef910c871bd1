//! Project-level custom modules.

use serde_json::json;

use crate::config::RunSettings;
use crate::engine::{identifier, include_guard, keyword, Environment};
use crate::error::{Result, TgenError};

use super::{EnvironmentExtension, ExtensionLog};

/// `build_info`: exposes `generator.name` and `generator.version`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildInfo;

impl EnvironmentExtension for BuildInfo {
    fn name(&self) -> &'static str {
        "build_info"
    }

    fn update_environment(
        &self,
        env: Environment,
        _settings: RunSettings,
        _log: &ExtensionLog<'_>,
    ) -> Result<Environment> {
        env.with_global(
            "generator",
            json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }),
        )
    }
}

/// `include_guard`: `include_guard(path="dsp/gain.h")` gives `DSP_GAIN_H`.
///
/// Builds on the `case` engine extension and refuses to load without it.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeGuard;

impl EnvironmentExtension for IncludeGuard {
    fn name(&self) -> &'static str {
        "include_guard"
    }

    fn update_environment(
        &self,
        env: Environment,
        _settings: RunSettings,
        log: &ExtensionLog<'_>,
    ) -> Result<Environment> {
        if !env.has_filter("shouty_snake_case") {
            log.error("the `case` engine extension is not loaded");
            return Err(TgenError::Extension {
                name: self.name().to_string(),
                message: "requires the `case` engine extension".to_string(),
            });
        }

        Ok(env.with_function("include_guard", include_guard))
    }
}

/// `identifier_tests`: template tests for names emitted into source code.
///
/// `{% if name is identifier %}` and `{% if name is keyword %}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierTests;

impl EnvironmentExtension for IdentifierTests {
    fn name(&self) -> &'static str {
        "identifier_tests"
    }

    fn update_environment(
        &self,
        env: Environment,
        _settings: RunSettings,
        _log: &ExtensionLog<'_>,
    ) -> Result<Environment> {
        Ok(env
            .with_tester("identifier", identifier)
            .with_tester("keyword", keyword))
    }
}
