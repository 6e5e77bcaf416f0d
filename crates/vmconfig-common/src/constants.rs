//! Well-known ExtraConfig keys, annotation keys, and defaults
//!
//! These values are part of the platform's wire vocabulary and must match what
//! guests and the virtualization platform expect byte for byte.

/// Canonical "true" value for boolean ExtraConfig entries
pub const EXTRA_CONFIG_TRUE: &str = "TRUE";

/// ExtraConfig key that tells the platform to power off the VM on host maintenance
pub const MM_POWER_OFF_VM_EXTRA_CONFIG_KEY: &str = "maintenance.vm.evacuation.poweroff";

/// ExtraConfig key enabling 64-bit MMIO for PCI passthrough devices
pub const PCI_PASSTHRU_MMIO_EXTRA_CONFIG_KEY: &str = "pciPassthru.use64bitMMIO";

/// ExtraConfig key holding the 64-bit MMIO window size in GB
pub const PCI_PASSTHRU_MMIO_SIZE_EXTRA_CONFIG_KEY: &str = "pciPassthru.64bitMMIOSizeGB";

/// Default 64-bit MMIO window size in GB
pub const PCI_PASSTHRU_MMIO_SIZE_DEFAULT: &str = "512";

/// ExtraConfig key that defers guest cloud-init until the VM service signals it
pub const DEFER_CLOUD_INIT_EXTRA_CONFIG_KEY: &str = "guestinfo.vmservice.defer-cloud-init";

/// Value the guest writes once it supports deferred cloud-init
pub const DEFER_CLOUD_INIT_READY: &str = "ready";

/// Value the engine writes to enable deferred cloud-init
pub const DEFER_CLOUD_INIT_ENABLED: &str = "enabled";

/// Annotation overriding the VM firmware kind
pub const FIRMWARE_OVERRIDE_ANNOTATION: &str = "vmoperator.vmware.com/firmware";

/// Annotation overriding the 64-bit MMIO window size
pub const PCI_PASSTHRU_MMIO_OVERRIDE_ANNOTATION: &str =
    "vmoperator.vmware.com/pci-passthru-64bit-mmio-size";

/// Annotation stamped on VMs created by the VM service
pub const VM_SERVICE_ANNOTATION: &str =
    "Virtual Machine managed by the vSphere Virtual Machine service";

/// ManagedBy extension key for VMs owned by the VM service
pub const MANAGED_BY_EXTENSION_KEY: &str = "com.vmware.vcenter.wcp";

/// ManagedBy type for VMs owned by the VM service
pub const MANAGED_BY_EXTENSION_TYPE: &str = "VirtualMachine";

/// First synthetic key handed to newly declared PCI devices; later ones count down
pub const PCI_DEVICE_KEY_BASE: i32 = -200;

/// Environment variable enabling the VM-class-as-config feature gate
pub const FSS_VM_CLASS_AS_CONFIG_ENV: &str = "FSS_WCP_VMCLASS_AS_CONFIG";

/// Environment variable enabling the VM-class-as-config day-N feature gate
pub const FSS_VM_CLASS_AS_CONFIG_DAY_N_DATE_ENV: &str = "FSS_WCP_VMCLASS_AS_CONFIG_DAYNDATE";
