//! Engine configuration: feature gates and conversion references
//!
//! Feature gates are plain data handed to every diff function that branches on
//! them, so each function can be exercised with a gate in either position.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{FSS_VM_CLASS_AS_CONFIG_DAY_N_DATE_ENV, FSS_VM_CLASS_AS_CONFIG_ENV};
use crate::{Error, Result};

/// Runtime toggles selecting between two policies for the same attribute
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureGates {
    /// VM class supplies a raw configuration fragment.
    ///
    /// When enabled, the network adapter class participates in device matching;
    /// when disabled, adapters are matched across classes.
    #[serde(default)]
    pub vm_class_as_config: bool,

    /// Day-N honoring of the class configuration fragment.
    ///
    /// When enabled, the class-level change-tracking value and ExtraConfig overlay
    /// take precedence over the per-VM sources.
    #[serde(default)]
    pub vm_class_as_config_day_n_date: bool,
}

impl FeatureGates {
    /// All gates enabled
    pub fn all() -> Self {
        Self {
            vm_class_as_config: true,
            vm_class_as_config_day_n_date: true,
        }
    }

    /// Read gates from the `FSS_*` environment variables
    ///
    /// A gate is enabled when its variable is `true` (case-insensitive).
    pub fn from_env() -> Self {
        let gates = Self {
            vm_class_as_config: env_flag(FSS_VM_CLASS_AS_CONFIG_ENV),
            vm_class_as_config_day_n_date: env_flag(FSS_VM_CLASS_AS_CONFIG_DAY_N_DATE_ENV),
        };
        debug!(
            vm_class_as_config = gates.vm_class_as_config,
            vm_class_as_config_day_n_date = gates.vm_class_as_config_day_n_date,
            "loaded feature gates from environment"
        );
        gates
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn default_min_cpu_freq_mhz() -> u64 {
    1
}

/// Operator-wide configuration for one engine instance
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Feature gates
    #[serde(default)]
    pub feature_gates: FeatureGates,

    /// Slowest host CPU frequency in the cluster, used to turn CPU quantities into MHz
    #[serde(default = "default_min_cpu_freq_mhz")]
    pub min_cpu_freq_mhz: u64,

    /// ExtraConfig entries applied to every VM at the lowest precedence
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub global_extra_config: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            feature_gates: FeatureGates::default(),
            min_cpu_freq_mhz: default_min_cpu_freq_mhz(),
            global_extra_config: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.min_cpu_freq_mhz == 0 {
            return Err(Error::config("minCpuFreqMhz must be greater than 0"));
        }
        Ok(())
    }
}
