//! ConfigSpecCompiler: assembles one change-set from every diff
//!
//! Each attribute is decided independently. Device operations are concatenated
//! family by family (network adapters, then PCI passthrough), each family's
//! removals ahead of its additions.

use tracing::info;
use vmconfig_common::model::{ChangeSet, DesiredState, LiveConfig, VirtualDevice};
use vmconfig_common::{EngineConfig, Error, FeatureGates, Result};
use vmconfig_devices::{
    create_pci_devices, DeviceReconciler, EthernetCardReconciler, KeyAllocator,
    PciPassthroughReconciler,
};

use crate::allocation::{diff_cpu_allocation, diff_memory_allocation};
use crate::change_tracking::diff_change_tracking;
use crate::device_groups::diff_device_groups;
use crate::extra_config::diff_overlay;
use crate::firmware::diff_firmware;
use crate::hardware::diff_hardware;

/// Computes the change-set converging a live VM toward its desired state
///
/// ```rust,ignore
/// let change_set = ConfigSpecCompiler::new(&live, &desired)
///     .with_feature_gates(FeatureGates::from_env())
///     .with_min_cpu_freq(2100)
///     .compile()?;
/// ```
pub struct ConfigSpecCompiler<'a> {
    live: &'a LiveConfig,
    desired: &'a DesiredState,
    gates: FeatureGates,
    min_cpu_freq_mhz: u64,
}

impl<'a> ConfigSpecCompiler<'a> {
    /// Create a compiler with all gates off and a 1 MHz CPU reference
    pub fn new(live: &'a LiveConfig, desired: &'a DesiredState) -> Self {
        let defaults = EngineConfig::default();
        Self {
            live,
            desired,
            gates: defaults.feature_gates,
            min_cpu_freq_mhz: defaults.min_cpu_freq_mhz,
        }
    }

    /// Set feature gates
    pub fn with_feature_gates(mut self, gates: FeatureGates) -> Self {
        self.gates = gates;
        self
    }

    /// Set the slowest host CPU frequency used to convert CPU quantities
    pub fn with_min_cpu_freq(mut self, mhz: u64) -> Self {
        self.min_cpu_freq_mhz = mhz;
        self
    }

    /// Take gates and CPU reference from an engine configuration
    ///
    /// Global ExtraConfig defaults travel in the desired bundle, not here.
    pub fn with_engine_config(self, config: &EngineConfig) -> Self {
        self.with_feature_gates(config.feature_gates)
            .with_min_cpu_freq(config.min_cpu_freq_mhz)
    }

    /// Compute the change-set
    ///
    /// Fails on malformed quantities and on desired devices that cannot be
    /// expressed; no partial change-set is returned.
    pub fn compile(self) -> Result<ChangeSet> {
        if self.min_cpu_freq_mhz == 0 {
            return Err(Error::config("minimum CPU frequency must be greater than 0"));
        }
        let live = self.live;
        let desired = self.desired;
        let class = desired.class_config.as_ref();

        let hardware = diff_hardware(live, desired)?;
        let cpu_allocation = diff_cpu_allocation(
            live.cpu_allocation.as_ref(),
            &desired.policies,
            self.min_cpu_freq_mhz,
        )?;
        let memory_allocation =
            diff_memory_allocation(live.memory_allocation.as_ref(), &desired.policies)?;

        // Class-supplied passthrough devices are honored with the day-N gate only
        let class_pci: &[VirtualDevice] = match class {
            Some(c) if self.gates.vm_class_as_config_day_n_date => c.pci_devices.as_slice(),
            _ => &[],
        };
        let pci_devices = create_pci_devices(&desired.hardware.devices, class_pci);

        let mut keys = KeyAllocator::new(&live.devices);
        keys.reserve(desired.network_interfaces.iter().map(|d| d.key));
        keys.reserve(pci_devices.iter().map(|d| d.key));

        let mut device_changes = EthernetCardReconciler::from_gates(&self.gates).reconcile_with(
            &desired.network_interfaces,
            &live.devices,
            &mut keys,
        )?;
        device_changes.extend(PciPassthroughReconciler.reconcile_with(
            &pci_devices,
            &live.devices,
            &mut keys,
        )?);

        let change_set = ChangeSet {
            annotation: hardware.annotation,
            managed_by: hardware.managed_by,
            num_cpus: hardware.num_cpus,
            memory_mb: hardware.memory_mb,
            cpu_allocation,
            memory_allocation,
            firmware: diff_firmware(live.firmware, desired.overrides.firmware.as_deref()),
            change_tracking_enabled: diff_change_tracking(
                live.change_tracking_enabled,
                class,
                &desired.advanced_options,
                &self.gates,
            ),
            device_groups: diff_device_groups(class),
            extra_config: diff_overlay(&live.extra_config, desired, &pci_devices, &self.gates),
            device_changes,
        };

        info!(
            scalar_changes = change_set.scalar_change_count(),
            device_changes = change_set.device_changes.len(),
            "computed VM config change-set"
        );
        Ok(change_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use vmconfig_common::model::{
        ClassConfigOverride, DeviceChange, DeviceGroup, DeviceGroups, PciBacking, VgpuDevice,
    };

    #[test]
    fn default_inputs_produce_empty_change_set() {
        let change_set = ConfigSpecCompiler::new(&LiveConfig::default(), &DesiredState::default())
            .compile()
            .unwrap();
        assert!(change_set.is_empty());
    }

    #[test]
    fn zero_cpu_frequency_is_a_config_error() {
        let err = ConfigSpecCompiler::new(&LiveConfig::default(), &DesiredState::default())
            .with_min_cpu_freq(0)
            .compile()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn bad_quantity_aborts_whole_change_set() {
        let mut desired = DesiredState::default();
        desired.hardware.memory = Some(Quantity("-1Gi".to_string()));
        let err = ConfigSpecCompiler::new(&LiveConfig::default(), &desired)
            .compile()
            .unwrap_err();
        assert!(err.is_bad_input());
    }

    #[test]
    fn class_pci_devices_follow_day_n_gate() {
        let mut desired = DesiredState::default();
        desired.class_config = Some(ClassConfigOverride {
            pci_devices: vec![VirtualDevice::pci_passthrough(
                -200,
                PciBacking::Vgpu {
                    profile: "SampleProfile2".to_string(),
                },
            )],
            ..Default::default()
        });
        desired.hardware.devices.vgpu_devices = vec![VgpuDevice {
            profile_name: "SampleProfile1".to_string(),
        }];
        let live = LiveConfig::default();

        let off = ConfigSpecCompiler::new(&live, &desired).compile().unwrap();
        assert_eq!(off.device_changes.len(), 1);

        let on = ConfigSpecCompiler::new(&live, &desired)
            .with_feature_gates(FeatureGates::all())
            .compile()
            .unwrap();
        let keys: Vec<_> = on
            .device_changes
            .iter()
            .map(|c| match c {
                DeviceChange::Add { device } => device.key,
                DeviceChange::Remove { key } => panic!("unexpected remove of {key}"),
            })
            .collect();
        assert_eq!(keys, vec![-200, -201]);
    }

    #[test]
    fn class_device_groups_written_with_gates_off() {
        let groups = DeviceGroups {
            device_group: vec![DeviceGroup {
                group_instance_key: 1,
                device_group_name: Some("group1".to_string()),
                vendor_name: None,
            }],
        };
        let desired = DesiredState {
            class_config: Some(ClassConfigOverride {
                device_groups: Some(groups.clone()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let change_set = ConfigSpecCompiler::new(&LiveConfig::default(), &desired)
            .compile()
            .unwrap();
        assert_eq!(change_set.device_groups, Some(groups));
    }
}
