//! vmconfig CLI library

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};
use vmconfig_common::telemetry::{init_logging, LoggingConfig};

/// vmconfig - compute VM configuration change-sets
#[derive(Parser, Debug)]
#[command(name = "vmconfig")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Diff a live VM configuration against a desired state
    Diff(commands::diff::DiffArgs),
    /// Print the JSON schema of an input document
    Schema(commands::schema::SchemaArgs),
}

impl Cli {
    /// Initialize logging and run the CLI command
    pub fn run(self) -> Result<()> {
        init_logging(LoggingConfig {
            json: self.json_logs,
            ..Default::default()
        })?;

        match self.command {
            Commands::Diff(args) => commands::diff::run(args),
            Commands::Schema(args) => commands::schema::run(args),
        }
    }
}
