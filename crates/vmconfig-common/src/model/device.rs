//! Virtual device descriptors
//!
//! Each device family has a closed backing type with an explicit equivalence
//! operation per variant. Equivalence never looks at the device's identity key:
//! two devices are "the same device" when they are connected to the same thing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identity key the platform assigns a device; negative keys are not yet assigned
pub type DeviceKey = i32;

/// A device in a VM's inventory
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualDevice {
    /// Identity key
    pub key: DeviceKey,

    /// Type tag and type-specific descriptor
    #[serde(flatten)]
    pub kind: DeviceKind,
}

/// Type tag of a virtual device
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DeviceKind {
    /// Network adapter
    EthernetCard(EthernetCard),

    /// PCI passthrough accelerator
    PciPassthrough(PciPassthrough),

    /// Any device the engine does not reconcile (disks, controllers, ...)
    #[serde(rename_all = "camelCase")]
    Other {
        /// Platform type name of the device
        type_name: String,
    },
}

impl VirtualDevice {
    /// Create a network adapter device
    pub fn ethernet_card(key: DeviceKey, card: EthernetCard) -> Self {
        Self {
            key,
            kind: DeviceKind::EthernetCard(card),
        }
    }

    /// Create a PCI passthrough device with the given backing
    pub fn pci_passthrough(key: DeviceKey, backing: PciBacking) -> Self {
        Self {
            key,
            kind: DeviceKind::PciPassthrough(PciPassthrough { backing }),
        }
    }

    /// Create a device the engine does not reconcile
    pub fn other(key: DeviceKey, type_name: impl Into<String>) -> Self {
        Self {
            key,
            kind: DeviceKind::Other {
                type_name: type_name.into(),
            },
        }
    }

    /// Network adapter descriptor, if this is a network adapter
    pub fn as_ethernet_card(&self) -> Option<&EthernetCard> {
        match &self.kind {
            DeviceKind::EthernetCard(card) => Some(card),
            _ => None,
        }
    }

    /// PCI passthrough descriptor, if this is a PCI passthrough device
    pub fn as_pci_passthrough(&self) -> Option<&PciPassthrough> {
        match &self.kind {
            DeviceKind::PciPassthrough(pci) => Some(pci),
            _ => None,
        }
    }

    /// Short type name used in logs and errors
    pub fn type_name(&self) -> &str {
        match &self.kind {
            DeviceKind::EthernetCard(card) => card.adapter.as_str(),
            DeviceKind::PciPassthrough(_) => "pciPassthrough",
            DeviceKind::Other { type_name } => type_name,
        }
    }
}

// =============================================================================
// Network adapters
// =============================================================================

/// Network adapter class (the emulated NIC model)
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AdapterClass {
    /// Paravirtual vmxnet3
    #[default]
    Vmxnet3,
    /// Paravirtual vmxnet2
    Vmxnet2,
    /// Emulated Intel E1000
    E1000,
    /// Emulated Intel E1000e
    E1000e,
    /// Emulated AMD PCnet32
    Pcnet32,
    /// SR-IOV virtual function
    Sriov,
}

impl AdapterClass {
    /// Lowercase platform name of the adapter class
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vmxnet3 => "vmxnet3",
            Self::Vmxnet2 => "vmxnet2",
            Self::E1000 => "e1000",
            Self::E1000e => "e1000e",
            Self::Pcnet32 => "pcnet32",
            Self::Sriov => "sriov",
        }
    }
}

/// How the adapter's MAC address is assigned
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MacAddressType {
    /// Platform generates the address
    #[default]
    Generated,
    /// Address is set explicitly
    Manual,
    /// Address is assigned by the platform's address pool
    Assigned,
}

/// What a network adapter is connected to
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NetworkBacking {
    /// Standard port group, identified by its network name
    #[serde(rename_all = "camelCase")]
    Network {
        /// Network name
        device_name: String,
    },

    /// Distributed switch port group
    #[serde(rename_all = "camelCase")]
    DistributedPort {
        /// Distributed switch UUID
        switch_uuid: String,
        /// Port group key on that switch
        portgroup_key: String,
    },

    /// Opaque (externally managed) network
    #[serde(rename_all = "camelCase")]
    OpaqueNetwork {
        /// Network type (e.g., "nsx.LogicalSwitch")
        network_type: String,
        /// Network identifier
        network_id: String,
    },
}

impl NetworkBacking {
    /// Returns true if both backings connect to the same target
    pub fn same_target(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Network { device_name: a }, Self::Network { device_name: b }) => a == b,
            (
                Self::DistributedPort {
                    switch_uuid: switch_a,
                    portgroup_key: portgroup_a,
                },
                Self::DistributedPort {
                    switch_uuid: switch_b,
                    portgroup_key: portgroup_b,
                },
            ) => switch_a == switch_b && portgroup_a == portgroup_b,
            (
                Self::OpaqueNetwork {
                    network_type: type_a,
                    network_id: id_a,
                },
                Self::OpaqueNetwork {
                    network_type: type_b,
                    network_id: id_b,
                },
            ) => type_a == type_b && id_a == id_b,
            _ => false,
        }
    }
}

/// Network adapter descriptor
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EthernetCard {
    /// Adapter class
    #[serde(default)]
    pub adapter: AdapterClass,

    /// Connection target
    pub backing: NetworkBacking,

    /// MAC address assignment mode
    #[serde(default)]
    pub address_type: MacAddressType,

    /// MAC address (compared only when the desired card's `address_type` is manual)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,

    /// Identity token assigned by an external network provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl EthernetCard {
    /// Create an adapter with a generated MAC address
    pub fn new(adapter: AdapterClass, backing: NetworkBacking) -> Self {
        Self {
            adapter,
            backing,
            address_type: MacAddressType::Generated,
            mac_address: None,
            external_id: None,
        }
    }

    /// Set a manual MAC address
    pub fn with_manual_mac(mut self, mac: impl Into<String>) -> Self {
        self.address_type = MacAddressType::Manual;
        self.mac_address = Some(mac.into());
        self
    }

    /// Set the external identity token
    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }

    /// The MAC address, if it was set manually
    pub fn manual_mac(&self) -> Option<&str> {
        match self.address_type {
            MacAddressType::Manual => self.mac_address.as_deref(),
            _ => None,
        }
    }
}

// =============================================================================
// PCI passthrough
// =============================================================================

/// Vendor/device ID pair a dynamic passthrough backing may bind to
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AllowedDevice {
    /// PCI vendor ID
    pub vendor_id: i32,
    /// PCI device ID
    pub device_id: i32,
}

/// What a PCI passthrough device is bound to
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PciBacking {
    /// Profile-based virtual GPU
    #[serde(rename_all = "camelCase")]
    Vgpu {
        /// vGPU profile name
        profile: String,
    },

    /// Dynamic DirectPath I/O device selected by vendor/device ID
    #[serde(rename_all = "camelCase")]
    DynamicDirectPath {
        /// Vendor/device IDs the platform may bind
        allowed_devices: Vec<AllowedDevice>,
        /// Label distinguishing otherwise identical devices
        #[serde(default)]
        custom_label: String,
    },

    /// A backing the engine cannot construct or compare
    #[serde(rename_all = "camelCase")]
    Other {
        /// Platform type name of the backing
        type_name: String,
    },
}

impl PciBacking {
    /// Returns true if the engine can build and compare this backing
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other { .. })
    }

    /// Returns true if both backings bind the same accelerator
    ///
    /// Unsupported backings are never equivalent to anything, including themselves.
    pub fn same_backing(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Vgpu { profile: a }, Self::Vgpu { profile: b }) => a == b,
            (
                Self::DynamicDirectPath {
                    allowed_devices: devices_a,
                    custom_label: label_a,
                },
                Self::DynamicDirectPath {
                    allowed_devices: devices_b,
                    custom_label: label_b,
                },
            ) => devices_a == devices_b && label_a == label_b,
            _ => false,
        }
    }
}

/// PCI passthrough device descriptor
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PciPassthrough {
    /// Backing
    pub backing: PciBacking,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dvpg(key: &str, uuid: &str) -> NetworkBacking {
        NetworkBacking::DistributedPort {
            switch_uuid: uuid.to_string(),
            portgroup_key: key.to_string(),
        }
    }

    #[test]
    fn distributed_port_backings_compare_switch_and_portgroup() {
        assert!(dvpg("key1", "uuid1").same_target(&dvpg("key1", "uuid1")));
        assert!(!dvpg("key1", "uuid1").same_target(&dvpg("key2", "uuid1")));
        assert!(!dvpg("key1", "uuid1").same_target(&dvpg("key1", "uuid2")));
    }

    #[test]
    fn backings_of_different_variants_never_match() {
        let network = NetworkBacking::Network {
            device_name: "key1".to_string(),
        };
        assert!(!network.same_target(&dvpg("key1", "uuid1")));
    }

    #[test]
    fn manual_mac_only_reported_in_manual_mode() {
        let card = EthernetCard::new(AdapterClass::Vmxnet3, dvpg("k", "u"));
        assert_eq!(card.manual_mac(), None);

        let mut generated = card.clone();
        generated.mac_address = Some("00:50:56:aa:bb:cc".to_string());
        assert_eq!(generated.manual_mac(), None);

        let manual = card.with_manual_mac("mac1");
        assert_eq!(manual.manual_mac(), Some("mac1"));
    }

    #[test]
    fn dynamic_backings_compare_ids_and_label() {
        let a = PciBacking::DynamicDirectPath {
            allowed_devices: vec![AllowedDevice {
                vendor_id: 1000,
                device_id: 100,
            }],
            custom_label: "sampleLabel3".to_string(),
        };
        let mut b = a.clone();
        assert!(a.same_backing(&b));

        if let PciBacking::DynamicDirectPath { custom_label, .. } = &mut b {
            *custom_label = "DifferentLabel".to_string();
        }
        assert!(!a.same_backing(&b));
    }

    #[test]
    fn unsupported_backing_never_matches() {
        let other = PciBacking::Other {
            type_name: "VirtualPCIPassthroughDeviceBackingInfo".to_string(),
        };
        assert!(!other.is_supported());
        assert!(!other.same_backing(&other));
    }

    #[test]
    fn device_json_shape() {
        let device = VirtualDevice::pci_passthrough(
            -200,
            PciBacking::Vgpu {
                profile: "grid_v100-4q".to_string(),
            },
        );
        let json = serde_json::to_value(&device).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "key": -200,
                "type": "pciPassthrough",
                "backing": {"type": "vgpu", "profile": "grid_v100-4q"}
            })
        );
        let back: VirtualDevice = serde_json::from_value(json).unwrap();
        assert_eq!(back, device);
    }

    #[test]
    fn ethernet_card_deserializes_with_defaults() {
        let device: VirtualDevice = serde_json::from_value(serde_json::json!({
            "key": 4000,
            "type": "ethernetCard",
            "backing": {"type": "network", "deviceName": "VM Network"}
        }))
        .unwrap();
        let card = device.as_ethernet_card().unwrap();
        assert_eq!(card.adapter, AdapterClass::Vmxnet3);
        assert_eq!(card.address_type, MacAddressType::Generated);
        assert_eq!(device.type_name(), "vmxnet3");
    }
}
