//! Shell completions generation.

use std::io::Write;

use clap::CommandFactory;
use clap_complete::Shell;

use crate::error::Result;

/// Write completions for `shell` to stdout.
pub fn run(shell: Shell) -> Result<()> {
    generate(shell, &mut std::io::stdout());
    Ok(())
}

pub fn generate(shell: Shell, out: &mut dyn Write) {
    let mut cmd = super::Cli::command();
    clap_complete::generate(shell, &mut cmd, "tgen", out);
}
