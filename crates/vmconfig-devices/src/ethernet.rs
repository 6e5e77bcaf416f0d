//! Network adapter reconciliation

use vmconfig_common::model::{EthernetCard, VirtualDevice};
use vmconfig_common::{Error, FeatureGates, Result};

use crate::reconcile::DeviceReconciler;

/// Reconciles network adapters
#[derive(Clone, Copy, Debug, Default)]
pub struct EthernetCardReconciler {
    /// Ignore the adapter class when deciding equivalence
    pub match_across_adapter_classes: bool,
}

impl EthernetCardReconciler {
    /// Create a reconciler
    pub fn new(match_across_adapter_classes: bool) -> Self {
        Self {
            match_across_adapter_classes,
        }
    }

    /// Adapter class participates in matching only while the VM class supplies
    /// the configuration
    pub fn from_gates(gates: &FeatureGates) -> Self {
        Self::new(!gates.vm_class_as_config)
    }

    fn cards_equivalent(&self, desired: &EthernetCard, current: &EthernetCard) -> bool {
        if !self.match_across_adapter_classes && desired.adapter != current.adapter {
            return false;
        }
        desired.backing.same_target(&current.backing)
            && mac_satisfied(desired, current)
            && desired.external_id == current.external_id
    }
}

/// A manual desired MAC must equal the live address, whatever the live assignment
/// mode; any other desired mode accepts every live address.
fn mac_satisfied(desired: &EthernetCard, current: &EthernetCard) -> bool {
    desired
        .manual_mac()
        .map_or(true, |mac| current.mac_address.as_deref() == Some(mac))
}

impl DeviceReconciler for EthernetCardReconciler {
    fn family(&self) -> &'static str {
        "ethernet"
    }

    fn claims(&self, device: &VirtualDevice) -> bool {
        device.as_ethernet_card().is_some()
    }

    fn validate(&self, device: &VirtualDevice) -> Result<()> {
        if self.claims(device) {
            Ok(())
        } else {
            Err(Error::unsupported_device(
                self.family(),
                device.key,
                format!("{} is not a network adapter", device.type_name()),
            ))
        }
    }

    fn equivalent(&self, desired: &VirtualDevice, current: &VirtualDevice) -> bool {
        match (desired.as_ethernet_card(), current.as_ethernet_card()) {
            (Some(want), Some(have)) => self.cards_equivalent(want, have),
            _ => false,
        }
    }
}
