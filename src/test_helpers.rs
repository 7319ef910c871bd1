//! Shared test utilities.
//!
//! [`Project`] lays out a throwaway project in a temp directory: a
//! `config.json` at the root, templates under `templates/` and output under
//! `out/`. Settings are written fresh each time [`Project::settings`] is
//! called, so options can be added in any order.
//!
//! ```ignore
//! use crate::test_helpers::Project;
//!
//! let project = Project::new()
//!     .stencil_dir("_stencils")
//!     .template("_stencils/license.inc", "// MIT")
//!     .template("a.tmpl", "### New file: a.h\n### Content:\n{% include \"_stencils/license.inc\" %}");
//!
//! project.generator().render_all(false, None).unwrap();
//! assert_eq!(project.output("a.h"), "// MIT");
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde_json::{json, Map, Value};
use tempfile::TempDir;

use crate::build::Generator;
use crate::config::RunSettings;
use crate::output::Printer;
use crate::report::{Reporter, Verbosity};

pub struct Project {
    dir: TempDir,
    options: Map<String, Value>,
}

impl Project {
    pub fn new() -> Self {
        let mut options = Map::new();
        options.insert("root_dir".into(), json!("."));
        options.insert("template_dir".into(), json!("templates"));
        options.insert("output_dir".into(), json!("out"));
        options.insert("included_suffixes".into(), json!(["*.tmpl"]));

        Self {
            dir: TempDir::new().unwrap(),
            options,
        }
    }

    pub fn stencil_dir(self, name: &str) -> Self {
        self.option("stencil_dir_name", json!(name))
    }

    /// Set any key of the configuration document.
    pub fn option(mut self, key: &str, value: Value) -> Self {
        self.options.insert(key.to_string(), value);
        self
    }

    /// Write a file below the template directory.
    pub fn template(self, relative: &str, content: &str) -> Self {
        let path = self.template_path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        self
    }

    pub fn root(&self) -> PathBuf {
        fs::canonicalize(self.dir.path()).unwrap()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.json")
    }

    pub fn template_path(&self, relative: &str) -> PathBuf {
        self.dir.path().join("templates").join(relative)
    }

    pub fn output_path(&self, relative: &str) -> PathBuf {
        self.dir.path().join("out").join(relative)
    }

    /// Contents of a generated file. Panics if it was not written.
    pub fn output(&self, relative: &str) -> String {
        let path = self.output_path(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("output {} not readable: {e}", path.display()))
    }

    pub fn settings(&self) -> RunSettings {
        let document = serde_json::to_string_pretty(&Value::Object(self.options.clone())).unwrap();
        fs::write(self.config_path(), document).unwrap();
        RunSettings::load(&self.config_path()).unwrap()
    }

    /// A reporter that prints progress dots and the summary only.
    pub fn reporter(&self) -> Reporter {
        Reporter::new(Printer::with_color(false), Verbosity::VeryLow)
    }

    pub fn generator(&self) -> Generator {
        Generator::new(self.settings(), self.reporter()).unwrap()
    }
}

/// Move the modification time of `path` by `offset` seconds from now.
pub fn set_mtime(path: &Path, offset: i64) {
    let now = SystemTime::now();
    let delta = Duration::from_secs(offset.unsigned_abs());
    let time = if offset < 0 { now - delta } else { now + delta };

    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(time).unwrap();
}
