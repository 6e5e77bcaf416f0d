//! Diff command

use std::path::PathBuf;

use clap::Args;
use tracing::info;
use vmconfig_common::model::{DesiredState, LiveConfig};
use vmconfig_common::{EngineConfig, FeatureGates};
use vmconfig_diff::ConfigSpecCompiler;

use super::load_document;
use crate::Result;

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Live VM configuration (JSON or YAML)
    #[arg(long)]
    pub live: PathBuf,

    /// Desired-state bundle (JSON or YAML)
    #[arg(long)]
    pub desired: PathBuf,

    /// Engine configuration; feature gates fall back to the FSS_* environment
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: DiffArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_document(path)?,
        None => EngineConfig {
            feature_gates: FeatureGates::from_env(),
            ..Default::default()
        },
    };
    config.validate()?;

    let live: LiveConfig = load_document(&args.live)?;
    let desired: DesiredState = load_document(&args.desired)?;

    let output = diff(&config, &live, desired)?;
    println!("{output}");
    Ok(())
}

/// Compute the change-set and render it as pretty JSON
///
/// Operator-wide ExtraConfig defaults fill in keys the bundle does not set.
pub fn diff(config: &EngineConfig, live: &LiveConfig, mut desired: DesiredState) -> Result<String> {
    for (key, value) in &config.global_extra_config {
        desired
            .global_extra_config
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }

    let change_set = ConfigSpecCompiler::new(live, &desired)
        .with_engine_config(config)
        .compile()?;

    if change_set.is_empty() {
        info!("VM configuration is up to date, no update needed");
    }
    Ok(serde_json::to_string_pretty(&change_set)?)
}
