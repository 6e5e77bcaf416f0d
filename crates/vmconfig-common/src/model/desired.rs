//! Desired-state bundle
//!
//! Assembled by the caller from the VM class, the VM spec and annotations, the
//! image status, and operator-wide defaults. Each source is kept separate so the
//! diff functions can apply their own precedence rules.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::device::VirtualDevice;
use super::live::{DeviceGroups, ManagedByInfo};
use crate::constants::{FIRMWARE_OVERRIDE_ANNOTATION, PCI_PASSTHRU_MMIO_OVERRIDE_ANNOTATION};

/// Everything the engine needs to decide what a VM's configuration should be
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesiredState {
    /// Class-declared hardware sizing and accelerator requests
    #[serde(default)]
    pub hardware: HardwareSpec,

    /// Class-declared resource policy
    #[serde(default)]
    pub policies: ResourcePolicy,

    /// Network adapters the VM should have, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_interfaces: Vec<VirtualDevice>,

    /// Raw configuration fragment supplied by the VM class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_config: Option<ClassConfigOverride>,

    /// Values extracted from the VM's annotations
    #[serde(default)]
    pub overrides: DesiredOverrides,

    /// Per-VM advanced options
    #[serde(default)]
    pub advanced_options: AdvancedOptions,

    /// How bootstrap metadata reaches the guest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_transport: Option<MetadataTransport>,

    /// Whether the image reports the legacy guest-init compatibility condition
    #[serde(default)]
    pub image_v1alpha1_compatible: bool,

    /// Volumes declared on the VM
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeSpec>,

    /// Operator-wide ExtraConfig defaults
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub global_extra_config: BTreeMap<String, String>,

    /// Annotation to stamp on VMs that do not have one yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,

    /// Ownership record to stamp on VMs that do not have one yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_by: Option<ManagedByInfo>,
}

impl DesiredState {
    /// Returns true if any declared volume is backed by instance storage
    pub fn has_instance_storage(&self) -> bool {
        self.volumes.iter().any(|v| v.instance_storage.is_some())
    }
}

// =============================================================================
// Class hardware and policy
// =============================================================================

/// Class-declared hardware
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HardwareSpec {
    /// Virtual CPU count; zero or absent means "not specified"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpus: Option<u32>,

    /// Memory size; zero or absent means "not specified"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<Quantity>,

    /// Accelerator requests
    #[serde(default)]
    pub devices: VirtualDevices,
}

/// Declared accelerator requests
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualDevices {
    /// Profile-based virtual GPUs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vgpu_devices: Vec<VgpuDevice>,

    /// Vendor/device-ID selected DirectPath I/O devices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dynamic_direct_path_io_devices: Vec<DynamicDirectPathIoDevice>,
}

impl VirtualDevices {
    /// Returns true if no accelerators are requested
    pub fn is_empty(&self) -> bool {
        self.vgpu_devices.is_empty() && self.dynamic_direct_path_io_devices.is_empty()
    }
}

/// A requested virtual GPU
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VgpuDevice {
    /// vGPU profile name
    pub profile_name: String,
}

/// A requested DirectPath I/O device
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DynamicDirectPathIoDevice {
    /// PCI vendor ID
    #[serde(rename = "vendorID")]
    pub vendor_id: i32,
    /// PCI device ID
    #[serde(rename = "deviceID")]
    pub device_id: i32,
    /// Label distinguishing otherwise identical devices
    #[serde(default)]
    pub custom_label: String,
}

/// Class-declared resource policy
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePolicy {
    /// Reservations
    #[serde(default)]
    pub requests: ResourceAmounts,

    /// Limits
    #[serde(default)]
    pub limits: ResourceAmounts,
}

/// CPU and memory amounts
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAmounts {
    /// CPU amount, converted to MHz against the minimum host frequency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<Quantity>,

    /// Memory amount, converted to MB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<Quantity>,
}

// =============================================================================
// Class configuration fragment
// =============================================================================

/// Raw configuration fragment carried by a VM class
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassConfigOverride {
    /// ExtraConfig entries that win over every other source
    ///
    /// Applied only with the `vm_class_as_config_day_n_date` gate.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_config: BTreeMap<String, String>,

    /// Changed-block tracking value
    ///
    /// Applied only with the `vm_class_as_config_day_n_date` gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_tracking_enabled: Option<bool>,

    /// Device-group topology to impose
    ///
    /// Not gated: written whenever present and non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_groups: Option<DeviceGroups>,

    /// PCI passthrough devices the class adds
    ///
    /// Applied only with the `vm_class_as_config_day_n_date` gate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pci_devices: Vec<VirtualDevice>,
}

// =============================================================================
// Per-VM inputs
// =============================================================================

/// Override values taken from the VM's annotations
///
/// Values are kept raw; the diff functions decide whether they are usable.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DesiredOverrides {
    /// Firmware kind override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware: Option<String>,

    /// 64-bit MMIO size override in GB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mmio_size: Option<String>,
}

impl DesiredOverrides {
    /// Extract override values from a VM annotation map
    pub fn from_annotations(annotations: &BTreeMap<String, String>) -> Self {
        Self {
            firmware: annotations.get(FIRMWARE_OVERRIDE_ANNOTATION).cloned(),
            mmio_size: annotations
                .get(PCI_PASSTHRU_MMIO_OVERRIDE_ANNOTATION)
                .cloned(),
        }
    }
}

/// Per-VM advanced options
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedOptions {
    /// Changed-block tracking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_block_tracking: Option<bool>,
}

/// How bootstrap metadata is delivered to the guest
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum MetadataTransport {
    /// Guestinfo ExtraConfig keys
    ExtraConfig,
    /// OVF environment
    OvfEnv,
    /// vApp properties
    #[serde(rename = "vAppConfig")]
    VAppConfig,
    /// In-guest cloud-init datasource
    CloudInit,
    /// Windows sysprep
    Sysprep,
}

/// A volume declared on the VM
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSpec {
    /// Volume name
    pub name: String,

    /// Set when the volume is carved from host-local instance storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_storage: Option<InstanceStorage>,
}

/// Instance storage claim
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceStorage {
    /// Storage class the volume is provisioned from
    pub storage_class: String,
    /// Requested size
    pub size: Quantity,
}
