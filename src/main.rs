use clap::Parser;
use miette::Result;
use tgen::cli::Cli;
use tgen::output::Printer;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.completions {
        Some(shell) => tgen::cli::completions::run(shell)?,
        None => {
            tgen::cli::render::run(&cli, Printer::new())?;
        }
    }

    Ok(())
}
