//! Schema command

use clap::{Args, ValueEnum};
use schemars::schema::RootSchema;
use schemars::schema_for;
use vmconfig_common::model::{ChangeSet, DesiredState, LiveConfig};
use vmconfig_common::EngineConfig;

use crate::Result;

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Document to describe
    #[arg(value_enum, default_value_t = Document::Desired)]
    pub document: Document,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Document {
    /// Desired-state bundle
    Desired,
    /// Live VM configuration
    Live,
    /// Computed change-set
    ChangeSet,
    /// Engine configuration
    Config,
}

pub fn run(args: SchemaArgs) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&schema(args.document))?);
    Ok(())
}

pub fn schema(document: Document) -> RootSchema {
    match document {
        Document::Desired => schema_for!(DesiredState),
        Document::Live => schema_for!(LiveConfig),
        Document::ChangeSet => schema_for!(ChangeSet),
        Document::Config => schema_for!(EngineConfig),
    }
}
