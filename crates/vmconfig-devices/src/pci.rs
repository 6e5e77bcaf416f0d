//! PCI passthrough reconciliation

use vmconfig_common::model::VirtualDevice;
use vmconfig_common::{Error, Result};

use crate::reconcile::DeviceReconciler;

/// Reconciles PCI passthrough accelerators (vGPU and dynamic DirectPath I/O)
///
/// Live passthrough devices with a backing the engine does not manage never
/// match a desired device and are therefore removed.
#[derive(Clone, Copy, Debug, Default)]
pub struct PciPassthroughReconciler;

impl DeviceReconciler for PciPassthroughReconciler {
    fn family(&self) -> &'static str {
        "pci"
    }

    fn claims(&self, device: &VirtualDevice) -> bool {
        device.as_pci_passthrough().is_some()
    }

    fn validate(&self, device: &VirtualDevice) -> Result<()> {
        match device.as_pci_passthrough() {
            Some(pci) if pci.backing.is_supported() => Ok(()),
            Some(_) => Err(Error::unsupported_device(
                self.family(),
                device.key,
                "passthrough backing is neither vGPU nor dynamic DirectPath I/O",
            )),
            None => Err(Error::unsupported_device(
                self.family(),
                device.key,
                format!("{} is not a PCI passthrough device", device.type_name()),
            )),
        }
    }

    fn equivalent(&self, desired: &VirtualDevice, current: &VirtualDevice) -> bool {
        match (desired.as_pci_passthrough(), current.as_pci_passthrough()) {
            (Some(want), Some(have)) => want.backing.same_backing(&have.backing),
            _ => false,
        }
    }
}
