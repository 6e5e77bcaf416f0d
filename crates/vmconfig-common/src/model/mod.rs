//! Engine data model: live snapshot, desired bundle, change-set, and devices

pub mod change_set;
pub mod desired;
pub mod device;
pub mod live;

pub use change_set::{ChangeSet, DeviceChange};
pub use desired::{
    AdvancedOptions, ClassConfigOverride, DesiredOverrides, DesiredState,
    DynamicDirectPathIoDevice, HardwareSpec, InstanceStorage, MetadataTransport, ResourceAmounts,
    ResourcePolicy, VgpuDevice, VirtualDevices, VolumeSpec,
};
pub use device::{
    AdapterClass, AllowedDevice, DeviceKey, DeviceKind, EthernetCard, MacAddressType,
    NetworkBacking, PciBacking, PciPassthrough, VirtualDevice,
};
pub use live::{
    DeviceGroup, DeviceGroups, Firmware, LiveConfig, ManagedByInfo, ResourceAllocation,
};
