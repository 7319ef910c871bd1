//! Incremental build controller.
//!
//! A [`Generator`] owns the settings, the template environment (with every
//! extension applied) and the reporter for one run. [`Generator::render_all`]
//! picks the templates to render, renders them, runs the post-render
//! commands and finally moves the watermark forward.
//!
//! Only renderable templates are compared against the watermark. Editing a
//! stencil alone does not make the templates that include it eligible for
//! an only-modified run; run a full build after changing stencils.

mod watermark;

use std::time::SystemTime;

use crate::command;
use crate::config::{Namespace, RunSettings};
use crate::discovery::candidates;
use crate::engine::Environment;
use crate::error::{Result, TgenError};
use crate::extensions::apply_extensions;
use crate::render::render_template;
use crate::report::{Reporter, RunStats};

pub use watermark::{unix_seconds, Watermark};

/// Renders a template tree according to one set of settings.
#[derive(Debug)]
pub struct Generator {
    settings: RunSettings,
    environment: Environment,
    reporter: Reporter,
}

impl Generator {
    /// Load every template and apply the configured extensions.
    pub fn new(settings: RunSettings, reporter: Reporter) -> Result<Self> {
        let environment = Environment::create(&settings)?;
        reporter.debug(&format!(
            "loaded {} templates and {} of {} stencils",
            environment.templates().len(),
            environment.loaded_stencils(),
            environment.stencils().len()
        ));

        let environment = apply_extensions(environment, &settings, &reporter)?;

        Ok(Self {
            settings,
            environment,
            reporter,
        })
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn watermark(&self) -> Watermark {
        Watermark::new(&self.settings.last_run_file)
    }

    /// Render a single template by name. The watermark is not touched.
    pub fn render(&mut self, name: &str, overrides: Option<&Namespace>) -> Result<RunStats> {
        if !self.environment.is_template(name) {
            return Err(TgenError::config(format!(
                "\"{}\" is not a renderable template",
                name
            )));
        }

        render_template(
            &self.environment,
            &self.settings,
            &mut self.reporter,
            name,
            overrides,
        )
    }

    /// Render every renderable template, or with `only_modified` those
    /// changed since the last run.
    ///
    /// A missing or unreadable watermark renders everything. The watermark
    /// is written only after a run that rendered at least one template and
    /// whose post-render commands all succeeded.
    pub fn render_all(
        &mut self,
        only_modified: bool,
        overrides: Option<&Namespace>,
    ) -> Result<RunStats> {
        let started = SystemTime::now();
        let watermark = self.watermark();

        let cutoff = if only_modified {
            let cutoff = watermark.read();
            if cutoff.is_none() {
                self.reporter
                    .debug("no usable watermark, rendering all templates");
            }
            cutoff
        } else {
            None
        };

        let templates = candidates(&self.settings, cutoff)?;
        self.reporter.start();

        let mut total = RunStats::default();
        for template in &templates {
            total += render_template(
                &self.environment,
                &self.settings,
                &mut self.reporter,
                &template.name,
                overrides,
            )?;
        }

        if templates.is_empty() {
            self.reporter.note("Skipped", "no templates changed");
            return Ok(total);
        }

        self.run_post_commands()?;
        watermark.write(unix_seconds(started))?;
        self.reporter.finish();

        Ok(total)
    }

    fn run_post_commands(&self) -> Result<()> {
        for command_line in &self.settings.post_commands {
            self.reporter.note("Running", command_line);
            let output = command::run_checked(command_line, &self.settings.root_dir)?;
            self.reporter.command_output(&output.stdout);
        }
        Ok(())
    }
}
