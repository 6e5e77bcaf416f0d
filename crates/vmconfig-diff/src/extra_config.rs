//! ExtraConfig overlay
//!
//! The overlay is built from named layers, lowest precedence first:
//!
//! 1. `global`: operator-wide defaults
//! 2. `derived`: maintenance-mode power-off and 64-bit MMIO flags for VMs with
//!    passthrough devices, power-off for VMs with instance storage
//! 3. `image`: defer cloud-init for compatible images not booted through cloud-init
//! 4. `class`: the VM class fragment, when the day-N gate is on
//!
//! Layers are folded left so later keys overwrite earlier ones, and the result is
//! diffed against the live ExtraConfig once.

use std::collections::BTreeMap;

use tracing::debug;
use vmconfig_common::constants::{
    DEFER_CLOUD_INIT_ENABLED, DEFER_CLOUD_INIT_EXTRA_CONFIG_KEY, DEFER_CLOUD_INIT_READY,
    EXTRA_CONFIG_TRUE, MM_POWER_OFF_VM_EXTRA_CONFIG_KEY, PCI_PASSTHRU_MMIO_EXTRA_CONFIG_KEY,
    PCI_PASSTHRU_MMIO_SIZE_DEFAULT, PCI_PASSTHRU_MMIO_SIZE_EXTRA_CONFIG_KEY,
};
use vmconfig_common::model::{DesiredState, MetadataTransport, VirtualDevice};
use vmconfig_common::FeatureGates;

/// Flat ExtraConfig key/value set
pub type ExtraConfig = BTreeMap<String, String>;

/// One named source of ExtraConfig entries
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverlayLayer {
    /// Layer name, for logs
    pub name: &'static str,
    /// Entries contributed by this layer
    pub entries: ExtraConfig,
}

impl OverlayLayer {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: ExtraConfig::new(),
        }
    }

    fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }
}

/// Build the overlay layers in precedence order
///
/// `pci_devices` is the target passthrough list (class devices plus requests).
/// `live` is consulted only for the guest's cloud-init readiness handshake.
pub fn overlay_layers(
    live: &ExtraConfig,
    desired: &DesiredState,
    pci_devices: &[VirtualDevice],
    gates: &FeatureGates,
) -> Vec<OverlayLayer> {
    let global = OverlayLayer {
        name: "global",
        entries: desired.global_extra_config.clone(),
    };

    let mut derived = OverlayLayer::new("derived");
    if !pci_devices.is_empty() {
        derived.set(MM_POWER_OFF_VM_EXTRA_CONFIG_KEY, EXTRA_CONFIG_TRUE);
        if let Some(size) = mmio_size(desired.overrides.mmio_size.as_deref()) {
            derived.set(PCI_PASSTHRU_MMIO_EXTRA_CONFIG_KEY, EXTRA_CONFIG_TRUE);
            derived.set(PCI_PASSTHRU_MMIO_SIZE_EXTRA_CONFIG_KEY, size);
        }
    }
    if desired.has_instance_storage() {
        derived.set(MM_POWER_OFF_VM_EXTRA_CONFIG_KEY, EXTRA_CONFIG_TRUE);
    }

    let mut image = OverlayLayer::new("image");
    let guest_ready = live
        .get(DEFER_CLOUD_INIT_EXTRA_CONFIG_KEY)
        .is_some_and(|v| v == DEFER_CLOUD_INIT_READY);
    if desired.image_v1alpha1_compatible
        && guest_ready
        && desired.metadata_transport != Some(MetadataTransport::CloudInit)
    {
        image.set(DEFER_CLOUD_INIT_EXTRA_CONFIG_KEY, DEFER_CLOUD_INIT_ENABLED);
    }

    let class = OverlayLayer {
        name: "class",
        entries: match &desired.class_config {
            Some(class) if gates.vm_class_as_config_day_n_date => class.extra_config.clone(),
            _ => ExtraConfig::new(),
        },
    };

    vec![global, derived, image, class]
}

/// MMIO size to configure, or `None` when MMIO is disabled
///
/// A numeric override wins over the default; `"0"` disables the MMIO keys.
/// Anything else is ignored.
fn mmio_size(override_value: Option<&str>) -> Option<String> {
    let Some(raw) = override_value else {
        return Some(PCI_PASSTHRU_MMIO_SIZE_DEFAULT.to_string());
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => None,
        Ok(_) => Some(raw.trim().to_string()),
        Err(_) => {
            debug!(value = raw, "ignoring non-numeric MMIO size override");
            Some(PCI_PASSTHRU_MMIO_SIZE_DEFAULT.to_string())
        }
    }
}

/// Fold layers into one overlay; later layers win
pub fn merge_layers(layers: &[OverlayLayer]) -> ExtraConfig {
    layers.iter().fold(ExtraConfig::new(), |mut merged, layer| {
        for (key, value) in &layer.entries {
            if let Some(previous) = merged.insert(key.clone(), value.clone()) {
                if &previous != value {
                    debug!(key = %key, layer = layer.name, "overlay key overridden");
                }
            }
        }
        merged
    })
}

/// Entries of `overlay` that are absent from or differ in `live`
pub fn diff_extra_config(live: &ExtraConfig, overlay: &ExtraConfig) -> ExtraConfig {
    overlay
        .iter()
        .filter(|(key, value)| live.get(*key) != Some(*value))
        .inspect(|(key, value)| debug!(key = %key, value = %value, "extraConfig changed"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Build, merge, and diff the ExtraConfig overlay
pub fn diff_overlay(
    live: &ExtraConfig,
    desired: &DesiredState,
    pci_devices: &[VirtualDevice],
    gates: &FeatureGates,
) -> ExtraConfig {
    let layers = overlay_layers(live, desired, pci_devices, gates);
    diff_extra_config(live, &merge_layers(&layers))
}
