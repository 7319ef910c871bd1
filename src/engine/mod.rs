//! Template environment: every template source, loaded once.
//!
//! The environment is a plain value. Extensions consume it and hand back a
//! new one (see [`crate::extensions`]); after that it is only read.

mod filters;
mod options;

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error as StdError;
use std::fs;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tera::{Context, Tera};

use crate::config::{Namespace, RunSettings};
use crate::discovery::{discover, TemplatePath};
use crate::error::{Result, TgenError};

pub(crate) use filters::{
    camel_case, debug, identifier, include_guard, kebab_case, keyword, pascal_case,
    shouty_snake_case, snake_case,
};
pub use options::{EngineOptions, Source};

/// The single top-level binding templates see the global namespace under.
pub const NAMESPACE_BINDING: &str = "globals";

/// Loaded templates plus everything extensions added.
#[derive(Debug, Clone)]
pub struct Environment {
    tera: Tera,
    sources: BTreeMap<String, Source>,
    templates: Vec<TemplatePath>,
    stencils: Vec<TemplatePath>,
    globals: Namespace,
    filters: BTreeSet<String>,
    functions: BTreeSet<String>,
    testers: BTreeSet<String>,
}

impl Environment {
    /// Discover and load every template below the template directory.
    pub fn create(settings: &RunSettings) -> Result<Self> {
        let set = discover(settings)?;

        if set.templates.is_empty() {
            return Err(TgenError::NoTemplates {
                dir: settings.template_dir.clone(),
            });
        }
        if let Some(name) = settings.stencil_dir_name() {
            if set.stencils.is_empty() {
                return Err(TgenError::NoStencils {
                    name: name.to_string(),
                    dir: settings.template_dir.clone(),
                });
            }
        }

        let mut sources = BTreeMap::new();
        for template in &set.templates {
            sources.insert(template.name.clone(), read_source(template, settings)?);
        }

        // Stencils are read and parsed only once a loaded source names them.
        let stencils: BTreeMap<&str, &TemplatePath> =
            set.stencils.iter().map(|s| (s.name.as_str(), s)).collect();
        let mut pending: Vec<String> = sources.keys().cloned().collect();
        while let Some(name) = pending.pop() {
            let named: Vec<&TemplatePath> = match sources.get(&name) {
                Some(source) => referenced_names(&source.processed)
                    .into_iter()
                    .filter_map(|n| stencils.get(n.as_str()).copied())
                    .collect(),
                None => continue,
            };
            for stencil in named {
                if !sources.contains_key(&stencil.name) {
                    sources.insert(stencil.name.clone(), read_source(stencil, settings)?);
                    pending.push(stencil.name.clone());
                }
            }
        }

        let mut tera = Tera::default();
        if settings.engine_options.autoescape {
            tera.autoescape_on(vec![""]);
        } else {
            tera.autoescape_on(vec![]);
        }

        tera.add_raw_templates(
            sources
                .iter()
                .map(|(name, source)| (name.as_str(), source.processed.as_str())),
        )
        .map_err(|e| load_error(&sources, &e))?;

        Ok(Self {
            tera,
            sources,
            templates: set.templates,
            stencils: set.stencils,
            globals: Namespace::new(),
            filters: BTreeSet::new(),
            functions: BTreeSet::new(),
            testers: BTreeSet::new(),
        })
    }

    /// Renderable templates, in walk order.
    pub fn templates(&self) -> &[TemplatePath] {
        &self.templates
    }

    pub fn stencils(&self) -> &[TemplatePath] {
        &self.stencils
    }

    /// True if `name` was read and handed to the engine.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Number of stencils some loaded template names.
    pub fn loaded_stencils(&self) -> usize {
        self.stencils.iter().filter(|s| self.is_loaded(&s.name)).count()
    }

    /// True if `name` is a loaded renderable template.
    pub fn is_template(&self, name: &str) -> bool {
        self.templates.iter().any(|t| t.name == name)
    }

    /// Values extensions exposed at the top level of every render.
    pub fn globals(&self) -> &Namespace {
        &self.globals
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.contains(name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    pub fn has_tester(&self, name: &str) -> bool {
        self.testers.contains(name)
    }

    /// Names of filters added on top of the engine's built-ins, sorted.
    pub fn filter_names(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(String::as_str)
    }

    /// Names of functions added on top of the engine's built-ins, sorted.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(String::as_str)
    }

    /// Names of tests added on top of the engine's built-ins, sorted.
    pub fn tester_names(&self) -> impl Iterator<Item = &str> {
        self.testers.iter().map(String::as_str)
    }

    /// Return an environment with `filter` registered under `name`.
    pub fn with_filter<F: tera::Filter + 'static>(mut self, name: &str, filter: F) -> Self {
        self.tera.register_filter(name, filter);
        self.filters.insert(name.to_string());
        self
    }

    /// Return an environment with `function` registered under `name`.
    pub fn with_function<F: tera::Function + 'static>(mut self, name: &str, function: F) -> Self {
        self.tera.register_function(name, function);
        self.functions.insert(name.to_string());
        self
    }

    /// Return an environment with `tester` usable as `{% if x is name %}`.
    pub fn with_tester<T: tera::Test + 'static>(mut self, name: &str, tester: T) -> Self {
        self.tera.register_tester(name, tester);
        self.testers.insert(name.to_string());
        self
    }

    /// Return an environment with an extra top-level value.
    ///
    /// The namespace binding is reserved and cannot be shadowed.
    pub fn with_global(mut self, name: &str, value: Value) -> Result<Self> {
        if name == NAMESPACE_BINDING {
            return Err(TgenError::config(format!(
                "`{}` is reserved for the global namespace",
                NAMESPACE_BINDING
            )));
        }
        self.globals.insert(name.to_string(), value);
        Ok(self)
    }

    /// Render template `name` with `namespace` bound to [`NAMESPACE_BINDING`].
    pub fn render(&self, name: &str, namespace: &Namespace) -> Result<String> {
        let mut context = Context::new();
        for (key, value) in &self.globals {
            context.insert(key.as_str(), value);
        }
        context.insert(NAMESPACE_BINDING, namespace);

        self.tera
            .render(name, &context)
            .map_err(|e| self.render_error(name, &e))
    }

    fn render_error(&self, name: &str, error: &tera::Error) -> TgenError {
        let message = error_chain(error);

        if let Some(line) = parse_location(&message) {
            let line = self
                .sources
                .get(name)
                .map(|s| s.original_line(line))
                .unwrap_or(line);
            return template_error(name, Some(line), message);
        }

        if let Some(needle) = missing_identifier(&message) {
            if let Some(line) = self.sources.get(name).and_then(|s| s.find_line(&needle)) {
                return template_error(name, Some(line), message);
            }
            for stencil in &self.stencils {
                if let Some(line) = self
                    .sources
                    .get(&stencil.name)
                    .and_then(|s| s.find_line(&needle))
                {
                    return template_error(&stencil.name, Some(line), message);
                }
            }
        }

        template_error(name, None, message)
    }
}

fn read_source(template: &TemplatePath, settings: &RunSettings) -> Result<Source> {
    let text = fs::read_to_string(&template.path).map_err(|e| TgenError::Io {
        path: template.path.clone(),
        message: format!("Failed to read template: {}", e),
    })?;
    Ok(Source::new(text, &settings.engine_options))
}

/// Template names quoted in `include`, `extends` and `import` tags.
fn referenced_names(text: &str) -> Vec<String> {
    static TAG: OnceLock<Regex> = OnceLock::new();
    static LITERAL: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| {
        Regex::new(r"(?s)\{%-?\s*(?:include|extends|import)\b(.*?)-?%\}").unwrap()
    });
    let literal =
        LITERAL.get_or_init(|| Regex::new(r#""([^"]*)"|'([^']*)'|`([^`]*)`"#).unwrap());

    tag.captures_iter(text)
        .filter_map(|c| c.get(1))
        .flat_map(|args| literal.captures_iter(args.as_str()))
        .filter_map(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn template_error(file: &str, line: Option<usize>, message: String) -> TgenError {
    TgenError::TemplateSyntax {
        file: file.to_string(),
        line,
        message,
    }
}

/// Map an error raised while loading templates to the failing file.
fn load_error(sources: &BTreeMap<String, Source>, error: &tera::Error) -> TgenError {
    let message = error_chain(error);
    let file = failing_template(&message).unwrap_or_else(|| "<templates>".to_string());
    let line = parse_location(&message).map(|line| {
        sources
            .get(&file)
            .map(|s| s.original_line(line))
            .unwrap_or(line)
    });
    template_error(&file, line, message)
}

/// The error and all its sources, one per line.
fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push('\n');
        message.push_str(inner.to_string().trim_end());
        source = inner.source();
    }
    message
}

fn parse_location(message: &str) -> Option<usize> {
    static LOCATION: OnceLock<Regex> = OnceLock::new();
    let re = LOCATION.get_or_init(|| Regex::new(r"-->\s*(\d+):(\d+)").unwrap());
    re.captures(message)?.get(1)?.as_str().parse().ok()
}

fn failing_template(message: &str) -> Option<String> {
    static NAME: OnceLock<Regex> = OnceLock::new();
    let re = NAME.get_or_init(|| Regex::new(r#"(?:parse|Template) ['"]([^'"]+)['"]"#).unwrap());
    Some(re.captures(message)?.get(1)?.as_str().to_string())
}

fn missing_identifier(message: &str) -> Option<String> {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    let re = IDENT
        .get_or_init(|| Regex::new(r"(?:Variable|Filter|Function|Test) `([^`]+)`").unwrap());
    Some(re.captures(message)?.get(1)?.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::Project;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ns(value: Value) -> Namespace {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_create_and_render() {
        let project = Project::new().template("greet.tmpl", "Hello {{ globals.name }}!");
        let env = Environment::create(&project.settings()).unwrap();

        let text = env.render("greet.tmpl", &ns(json!({"name": "World"}))).unwrap();

        assert_eq!(text, "Hello World!");
        assert!(env.is_template("greet.tmpl"));
    }

    #[test]
    fn test_namespace_is_not_top_level() {
        let project = Project::new().template("greet.tmpl", "Hello {{ name }}!");
        let env = Environment::create(&project.settings()).unwrap();

        let result = env.render("greet.tmpl", &ns(json!({"name": "World"})));

        assert!(matches!(result, Err(TgenError::TemplateSyntax { .. })));
    }

    #[test]
    fn test_no_templates() {
        let project = Project::new().template("notes.txt", "not a template");
        let result = Environment::create(&project.settings());
        assert!(matches!(result, Err(TgenError::NoTemplates { .. })));
    }

    #[test]
    fn test_only_stencils_is_no_templates() {
        let project = Project::new()
            .stencil_dir("inc")
            .template("inc/header.tmpl", "H");
        let result = Environment::create(&project.settings());
        assert!(matches!(result, Err(TgenError::NoTemplates { .. })));
    }

    #[test]
    fn test_no_stencils() {
        let project = Project::new()
            .stencil_dir("inc")
            .template("a.tmpl", "A");
        let result = Environment::create(&project.settings());
        assert!(matches!(result, Err(TgenError::NoStencils { .. })));
    }

    #[test]
    fn test_include_stencil_from_subdirectory() {
        let project = Project::new()
            .stencil_dir("_stencils")
            .template("_stencils/license.inc", "// licensed")
            .template(
                "deep/nested/a.tmpl",
                "{% include \"_stencils/license.inc\" %}\nint a;",
            );
        let env = Environment::create(&project.settings()).unwrap();

        let text = env.render("deep/nested/a.tmpl", &Namespace::new()).unwrap();

        assert_eq!(text, "// licensed\nint a;");
        assert_eq!(env.stencils().len(), 1);
        assert_eq!(env.templates().len(), 1);
    }

    #[test]
    fn test_unnamed_stencil_files_are_not_loaded() {
        let project = Project::new()
            .stencil_dir("_stencils")
            .template("_stencils/license.inc", "// licensed")
            .template("_stencils/README.md", "Use {{ like this")
            .template("a.tmpl", "{% include \"_stencils/license.inc\" %}");
        fs::write(project.template_path("_stencils/.DS_Store"), [0u8, 0xff, 0xfe, 0x80]).unwrap();

        let env = Environment::create(&project.settings()).unwrap();

        assert_eq!(env.render("a.tmpl", &Namespace::new()).unwrap(), "// licensed");
        assert_eq!(env.stencils().len(), 3);
        assert_eq!(env.loaded_stencils(), 1);
        assert!(!env.is_loaded("_stencils/README.md"));
    }

    #[test]
    fn test_stencils_named_by_stencils_are_loaded() {
        let project = Project::new()
            .stencil_dir("_stencils")
            .template("_stencils/outer.inc", "[{%- include '_stencils/inner.inc' -%}]")
            .template("_stencils/inner.inc", "inner")
            .template("a.tmpl", "{% include \"_stencils/outer.inc\" %}");

        let env = Environment::create(&project.settings()).unwrap();

        assert_eq!(env.render("a.tmpl", &Namespace::new()).unwrap(), "[inner]");
        assert_eq!(env.loaded_stencils(), 2);
    }

    #[test]
    fn test_broken_stencil_fails_once_included() {
        let project = Project::new()
            .stencil_dir("_stencils")
            .template("_stencils/broken.inc", "Use {{ like this")
            .template("a.tmpl", "{% include \"_stencils/broken.inc\" %}");

        let err = Environment::create(&project.settings()).unwrap_err();

        match err {
            TgenError::TemplateSyntax { file, .. } => assert_eq!(file, "_stencils/broken.inc"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_referenced_names() {
        let text = "it's {% include \"a.inc\" %} {%- extends 'b.inc' -%} {% import `c.inc` as m %} \"d.inc\"";
        assert_eq!(referenced_names(text), vec!["a.inc", "b.inc", "c.inc"]);
    }

    #[test]
    fn test_syntax_error_reports_file_and_line() {
        let project = Project::new().template("bad.tmpl", "line one\nline two\n{{ 1 + }}\nline four");
        let err = Environment::create(&project.settings()).unwrap_err();

        match err {
            TgenError::TemplateSyntax { file, line, .. } => {
                assert_eq!(file, "bad.tmpl");
                assert_eq!(line, Some(3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_variable_reports_line() {
        let project =
            Project::new().template("greet.tmpl", "first\nsecond {{ globals.missing }}\n");
        let env = Environment::create(&project.settings()).unwrap();

        let err = env.render("greet.tmpl", &Namespace::new()).unwrap_err();

        match err {
            TgenError::TemplateSyntax { file, line, message } => {
                assert_eq!(file, "greet.tmpl");
                assert_eq!(line, Some(2));
                assert!(message.contains("globals.missing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_trim_blocks_option() {
        let project = Project::new()
            .option("engine_options", json!({"trim_blocks": true}))
            .template("a.tmpl", "{% if true %}\nyes\n{% endif %}\ndone");
        let env = Environment::create(&project.settings()).unwrap();

        assert_eq!(env.render("a.tmpl", &Namespace::new()).unwrap(), "yes\ndone");
    }

    #[test]
    fn test_autoescape_off_by_default() {
        let project = Project::new().template("a.tmpl", "{{ globals.v }}");
        let env = Environment::create(&project.settings()).unwrap();

        let text = env.render("a.tmpl", &ns(json!({"v": "a < b && c"}))).unwrap();

        assert_eq!(text, "a < b && c");
    }

    #[test]
    fn test_autoescape_option() {
        let project = Project::new()
            .option("engine_options", json!({"autoescape": true}))
            .template("a.tmpl", "{{ globals.v }}");
        let env = Environment::create(&project.settings()).unwrap();

        let text = env.render("a.tmpl", &ns(json!({"v": "<b>"}))).unwrap();

        assert_eq!(text, "&lt;b&gt;");
    }

    #[test]
    fn test_with_global_and_filter() {
        let project = Project::new().template("a.tmpl", "{{ tool | snake_case }}");
        let env = Environment::create(&project.settings())
            .unwrap()
            .with_filter("snake_case", snake_case)
            .with_global("tool", json!("CodeGen"))
            .unwrap();

        assert!(env.has_filter("snake_case"));
        assert_eq!(env.render("a.tmpl", &Namespace::new()).unwrap(), "code_gen");
    }

    #[test]
    fn test_with_tester() {
        let project = Project::new().template(
            "a.tmpl",
            "{% for n in globals.names %}{% if n is identifier %}{{ n }};{% endif %}{% endfor %}",
        );
        let env = Environment::create(&project.settings())
            .unwrap()
            .with_tester("identifier", identifier);

        let text = env
            .render("a.tmpl", &ns(json!({"names": ["gain", "2x", "meter_db"]})))
            .unwrap();

        assert!(env.has_tester("identifier"));
        assert_eq!(env.tester_names().collect::<Vec<_>>(), vec!["identifier"]);
        assert_eq!(text, "gain;meter_db;");
    }

    #[test]
    fn test_namespace_binding_is_reserved() {
        let project = Project::new().template("a.tmpl", "A");
        let env = Environment::create(&project.settings()).unwrap();

        assert!(env.with_global(NAMESPACE_BINDING, json!({})).is_err());
    }

    #[test]
    fn test_parse_location() {
        assert_eq!(parse_location(" --> 12:4\n  |"), Some(12));
        assert_eq!(parse_location("no location"), None);
    }

    #[test]
    fn test_failing_template() {
        assert_eq!(
            failing_template("Failed to parse 'api/a.tmpl'\n --> 1:2"),
            Some("api/a.tmpl".to_string())
        );
        assert_eq!(
            failing_template("Failed to parse \"b.tmpl\""),
            Some("b.tmpl".to_string())
        );
    }
}
