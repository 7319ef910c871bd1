//! The default command: render a template tree.

use std::path::Path;

use crate::build::Generator;
use crate::config::{GlobalOverride, RunSettings};
use crate::error::{Result, TgenError};
use crate::output::{display_path, Printer};
use crate::report::{Reporter, RunStats, Verbosity};

use super::Cli;

pub fn run(cli: &Cli, printer: Printer) -> Result<RunStats> {
    let path = cli.settings.as_deref().ok_or_else(|| TgenError::Configuration {
        message: "No settings document given".to_string(),
        help: Some("Pass the path to a JSON or YAML settings document".to_string()),
    })?;

    let verbosity = cli.verbosity();
    if verbosity >= Verbosity::Normal {
        printer.status("Loading", &display_path(path));
    }

    let overrides = cli
        .globals
        .as_deref()
        .map(GlobalOverride::parse)
        .transpose()?;

    render(path, cli.only_modified, overrides.as_ref(), Reporter::new(printer, verbosity))
}

/// Load `settings_path` and render it.
pub fn render(
    settings_path: &Path,
    only_modified: bool,
    overrides: Option<&GlobalOverride>,
    reporter: Reporter,
) -> Result<RunStats> {
    let settings = RunSettings::load(settings_path)?;
    let mut generator = Generator::new(settings, reporter)?;
    generator.render_all(only_modified, overrides.map(GlobalOverride::namespace))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::Project;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tgen").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_run_renders_project() {
        let project = Project::new()
            .option("global_namespace", json!({"who": "config"}))
            .template("greet.tmpl", "### New file: hello.txt\n### Content:\nHello {{ globals.who }}!");
        project.settings();
        let config = project.config_path();

        let stats = run(
            &cli(&[config.to_str().unwrap(), "--silent"]),
            Printer::with_color(false),
        )
        .unwrap();

        assert_eq!(stats.files_saved, 1);
        assert_eq!(project.output("hello.txt"), "Hello config!");
    }

    #[test]
    fn test_run_with_globals_override() {
        let project = Project::new()
            .option("global_namespace", json!({"who": "config"}))
            .template("greet.tmpl", "### New file: hello.txt\n### Content:\nHello {{ globals.who }}!");
        project.settings();
        let config = project.config_path();

        run(
            &cli(&[config.to_str().unwrap(), "--silent", "-g", "{\"who\": \"cli\"}"]),
            Printer::with_color(false),
        )
        .unwrap();

        assert_eq!(project.output("hello.txt"), "Hello cli!");
    }

    #[test]
    fn test_run_with_bad_override() {
        let project = Project::new().template("a.tmpl", "A");
        project.settings();
        let config = project.config_path();

        let result = run(
            &cli(&[config.to_str().unwrap(), "--silent", "-g", "{not json"]),
            Printer::with_color(false),
        );

        assert!(matches!(result, Err(TgenError::Configuration { .. })));
    }

    #[test]
    fn test_run_with_missing_settings() {
        let result = run(
            &cli(&["/nonexistent/settings.json", "--silent"]),
            Printer::with_color(false),
        );
        assert!(result.is_err());
    }
}
