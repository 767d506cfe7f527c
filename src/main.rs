//! Command-line interface for extracting requirements from specification
//! documents.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
