use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for tgen operations
#[derive(Error, Diagnostic, Debug)]
pub enum TgenError {
    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(tgen::io))]
    Io { path: PathBuf, message: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(tgen::config))]
    Configuration {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("No templates found in {}", dir.display())]
    #[diagnostic(
        code(tgen::no_templates),
        help("Check `included_suffixes` and that templates live outside the stencil directory")
    )]
    NoTemplates { dir: PathBuf },

    #[error("No stencils found in directories named \"{name}\" under {}", dir.display())]
    #[diagnostic(
        code(tgen::no_stencils),
        help("Set `stencil_dir_name` to \"\" if the project has no stencils")
    )]
    NoStencils { name: String, dir: PathBuf },

    #[error("Template error in {file}{}: {message}", line_suffix(.line))]
    #[diagnostic(code(tgen::template))]
    TemplateSyntax {
        file: String,
        line: Option<usize>,
        message: String,
    },

    #[error("Malformed output from {template}: {message}")]
    #[diagnostic(
        code(tgen::output_structure),
        help("Every file section needs one new-file marker line and exactly one content marker")
    )]
    OutputStructure { template: String, message: String },

    #[error("Output directory {} does not exist", dir.display())]
    #[diagnostic(
        code(tgen::missing_directory),
        help("Create it, or set `create_directories` to true")
    )]
    MissingOutputDirectory { dir: PathBuf },

    #[error("Extension \"{name}\" failed: {message}")]
    #[diagnostic(code(tgen::extension))]
    Extension { name: String, message: String },

    #[error("Command `{command}` exited with {}: {stderr}", exit_code_label(.code))]
    #[diagnostic(code(tgen::command))]
    Command {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl TgenError {
    /// Shorthand for a configuration error without help text.
    pub fn config(message: impl Into<String>) -> Self {
        TgenError::Configuration {
            message: message.into(),
            help: None,
        }
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(n) => format!(" (line {})", n),
        None => String::new(),
    }
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "no status (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, TgenError>;
