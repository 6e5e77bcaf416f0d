//! Live configuration snapshot
//!
//! The platform's current view of a VM, as read by the caller immediately before
//! a reconciliation pass. The engine only ever borrows it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::device::VirtualDevice;
use crate::constants::{MANAGED_BY_EXTENSION_KEY, MANAGED_BY_EXTENSION_TYPE};

/// Firmware kind
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Firmware {
    /// Legacy BIOS
    Bios,
    /// UEFI
    Efi,
}

impl Firmware {
    /// Lowercase platform name of the firmware kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bios => "bios",
            Self::Efi => "efi",
        }
    }
}

impl fmt::Display for Firmware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Firmware {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bios" => Ok(Self::Bios),
            "efi" => Ok(Self::Efi),
            other => Err(format!("unknown firmware '{other}', expected bios or efi")),
        }
    }
}

/// CPU or memory allocation (reservation and limit in platform units)
///
/// In a change-set, a field is set only when it differs from the live value.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAllocation {
    /// Guaranteed amount (MHz for CPU, MB for memory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation: Option<i64>,

    /// Upper bound (MHz for CPU, MB for memory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl ResourceAllocation {
    /// Returns true if neither field is set
    pub fn is_empty(&self) -> bool {
        self.reservation.is_none() && self.limit.is_none()
    }
}

/// Extension that owns a VM
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedByInfo {
    /// Owning extension key
    pub extension_key: String,
    /// Managed entity type
    #[serde(rename = "type")]
    pub type_: String,
}

impl ManagedByInfo {
    /// Ownership record for VMs created by the VM service
    pub fn vm_service() -> Self {
        Self {
            extension_key: MANAGED_BY_EXTENSION_KEY.to_string(),
            type_: MANAGED_BY_EXTENSION_TYPE.to_string(),
        }
    }
}

/// One device group in the VM's device-group topology
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceGroup {
    /// Key tying devices to this group instance
    pub group_instance_key: i32,

    /// Vendor-defined group name, for vendor device groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_group_name: Option<String>,

    /// Vendor name, for vendor device groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
}

/// Device-group topology
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceGroups {
    /// Groups in platform order
    #[serde(default)]
    pub device_group: Vec<DeviceGroup>,
}

impl DeviceGroups {
    /// Returns true if there are no groups
    pub fn is_empty(&self) -> bool {
        self.device_group.is_empty()
    }
}

/// Immutable snapshot of a VM's current platform configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LiveConfig {
    /// Free-form VM annotation (empty when unset)
    #[serde(default)]
    pub annotation: String,

    /// Owning extension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_by: Option<ManagedByInfo>,

    /// Virtual CPU count
    #[serde(default)]
    pub num_cpus: u32,

    /// Memory size in MB
    #[serde(default)]
    pub memory_mb: i64,

    /// CPU allocation in MHz
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_allocation: Option<ResourceAllocation>,

    /// Memory allocation in MB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_allocation: Option<ResourceAllocation>,

    /// Firmware kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware: Option<Firmware>,

    /// Changed-block tracking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_tracking_enabled: Option<bool>,

    /// Device-group topology
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_groups: Option<DeviceGroups>,

    /// Full device inventory in platform order
    #[serde(default)]
    pub devices: Vec<VirtualDevice>,

    /// Flat key/value metadata (ExtraConfig)
    #[serde(default)]
    pub extra_config: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firmware_parses_known_kinds_only() {
        assert_eq!("bios".parse::<Firmware>(), Ok(Firmware::Bios));
        assert_eq!("efi".parse::<Firmware>(), Ok(Firmware::Efi));
        assert!("invalidfirmware".parse::<Firmware>().is_err());
        assert!("EFI".parse::<Firmware>().is_err());
    }

    #[test]
    fn empty_snapshot_deserializes() {
        let live: LiveConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(live, LiveConfig::default());
        assert!(live.annotation.is_empty());
    }

    #[test]
    fn managed_by_uses_type_key() {
        let json = serde_json::to_value(ManagedByInfo::vm_service()).unwrap();
        assert_eq!(json["extensionKey"], "com.vmware.vcenter.wcp");
        assert_eq!(json["type"], "VirtualMachine");
    }
}
