//! PCI passthrough device construction from declared accelerator requests

use std::collections::BTreeSet;

use tracing::debug;
use vmconfig_common::constants::PCI_DEVICE_KEY_BASE;
use vmconfig_common::model::{AllowedDevice, DeviceKey, PciBacking, VirtualDevice, VirtualDevices};

/// Build the target PCI passthrough list
///
/// Class-supplied devices come first, unchanged. Each declared request is then
/// appended as a new device: vGPU profiles before DirectPath I/O devices, keys
/// counting down from `-200` past any key the class devices already use.
/// Duplicate requests produce duplicate devices.
pub fn create_pci_devices(
    requests: &VirtualDevices,
    class_devices: &[VirtualDevice],
) -> Vec<VirtualDevice> {
    let used: BTreeSet<DeviceKey> = class_devices.iter().map(|d| d.key).collect();
    let mut next_key = PCI_DEVICE_KEY_BASE;
    let mut fresh_key = || {
        while used.contains(&next_key) {
            next_key -= 1;
        }
        let key = next_key;
        next_key -= 1;
        key
    };

    let vgpus = requests.vgpu_devices.iter().map(|v| PciBacking::Vgpu {
        profile: v.profile_name.clone(),
    });
    let ddpios = requests
        .dynamic_direct_path_io_devices
        .iter()
        .map(|d| PciBacking::DynamicDirectPath {
            allowed_devices: vec![AllowedDevice {
                vendor_id: d.vendor_id,
                device_id: d.device_id,
            }],
            custom_label: d.custom_label.clone(),
        });

    let mut devices = class_devices.to_vec();
    devices.extend(
        vgpus
            .chain(ddpios)
            .map(|backing| VirtualDevice::pci_passthrough(fresh_key(), backing)),
    );

    debug!(
        class_devices = class_devices.len(),
        requested = devices.len() - class_devices.len(),
        "built PCI device list"
    );
    devices
}
