//! Sparse configuration delta
//!
//! Every field defaults to absent. A field is present only when the engine
//! decided the platform value must change; an entirely empty change-set means
//! no update is needed.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::device::{DeviceKey, VirtualDevice};
use super::live::{DeviceGroups, Firmware, ManagedByInfo, ResourceAllocation};

/// A single device-inventory operation
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum DeviceChange {
    /// Add a new device
    Add {
        /// Device to create; its key is negative or otherwise unused
        device: VirtualDevice,
    },
    /// Remove a live device
    Remove {
        /// Identity key of the live device
        key: DeviceKey,
    },
}

impl DeviceChange {
    /// Returns true for removals
    pub fn is_remove(&self) -> bool {
        matches!(self, Self::Remove { .. })
    }
}

/// Change-set submitted to converge a VM toward its desired state
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    /// New VM annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,

    /// New ownership record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_by: Option<ManagedByInfo>,

    /// New virtual CPU count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_cpus: Option<u32>,

    /// New memory size in MB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<i64>,

    /// CPU allocation fields that change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_allocation: Option<ResourceAllocation>,

    /// Memory allocation fields that change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_allocation: Option<ResourceAllocation>,

    /// New firmware kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware: Option<Firmware>,

    /// New changed-block tracking value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_tracking_enabled: Option<bool>,

    /// Replacement device-group topology
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_groups: Option<DeviceGroups>,

    /// ExtraConfig entries to set
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_config: BTreeMap<String, String>,

    /// Device operations, removals before additions within each device family
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub device_changes: Vec<DeviceChange>,
}

impl ChangeSet {
    /// Returns true if nothing needs to change
    pub fn is_empty(&self) -> bool {
        self.annotation.is_none()
            && self.managed_by.is_none()
            && self.num_cpus.is_none()
            && self.memory_mb.is_none()
            && self.cpu_allocation.is_none()
            && self.memory_allocation.is_none()
            && self.firmware.is_none()
            && self.change_tracking_enabled.is_none()
            && self.device_groups.is_none()
            && self.extra_config.is_empty()
            && self.device_changes.is_empty()
    }

    /// Number of scalar attributes (including ExtraConfig keys) that change
    pub fn scalar_change_count(&self) -> usize {
        [
            self.annotation.is_some(),
            self.managed_by.is_some(),
            self.num_cpus.is_some(),
            self.memory_mb.is_some(),
            self.cpu_allocation.is_some(),
            self.memory_allocation.is_some(),
            self.firmware.is_some(),
            self.change_tracking_enabled.is_some(),
            self.device_groups.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
            + self.extra_config.len()
    }
}
