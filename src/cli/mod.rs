pub mod completions;
pub mod render;

use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use clap_complete::Shell;

use crate::report::Verbosity;

/// tgen - render a directory of templates into a source tree
#[derive(Parser, Debug)]
#[command(name = "tgen")]
#[command(version, about, long_about = None)]
#[command(group(
    ArgGroup::new("verbosity")
        .args(["silent", "quiet", "normal", "verbose"])
        .multiple(false)
))]
pub struct Cli {
    /// Settings document (JSON, or YAML when it ends in .yaml/.yml)
    #[arg(required_unless_present = "completions")]
    pub settings: Option<PathBuf>,

    /// Only render templates modified since the last run
    #[arg(short = 'm', long)]
    pub only_modified: bool,

    /// Override global namespace values with a JSON object or a JSON/YAML file
    #[arg(short = 'g', long, value_name = "LITERAL|PATH")]
    pub globals: Option<String>,

    /// Print progress dots and a short summary
    #[arg(long)]
    pub silent: bool,

    /// Print a line per template and the summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Also print a line per saved file (default)
    #[arg(long)]
    pub normal: bool,

    /// Also print extension debug output and timing
    #[arg(short, long)]
    pub verbose: bool,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL", exclusive = true)]
    pub completions: Option<Shell>,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.silent {
            Verbosity::VeryLow
        } else if self.quiet {
            Verbosity::Low
        } else if self.verbose {
            Verbosity::High
        } else {
            Verbosity::Normal
        }
    }
}
