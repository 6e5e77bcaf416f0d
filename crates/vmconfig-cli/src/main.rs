//! vmconfig CLI
//!
//! Reads a live VM configuration and a desired-state bundle and prints the
//! change-set that converges them.

use clap::Parser;

use vmconfig_cli::{Cli, Result};

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.run()
}
