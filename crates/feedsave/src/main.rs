//! feedsave - Main Entry Point

mod cli;
mod download;
mod logging;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    logging::init_logging()?;

    let cli = cli::Cli::parse();
    cli.run()
}
