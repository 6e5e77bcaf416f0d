//! Hardware sizing and ownership stamping

use tracing::debug;
use vmconfig_common::model::{DesiredState, LiveConfig, ManagedByInfo};
use vmconfig_common::quantity::{memory_quantity_to_mb, requested_quantity};
use vmconfig_common::Result;

/// Hardware fields that change
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HardwareUpdate {
    /// New virtual CPU count
    pub num_cpus: Option<u32>,
    /// New memory size in MB
    pub memory_mb: Option<i64>,
    /// Annotation for a VM that has none
    pub annotation: Option<String>,
    /// Ownership record for a VM that has none
    pub managed_by: Option<ManagedByInfo>,
}

/// Diff CPU count and memory size, and stamp ownership on unowned VMs
///
/// A CPU count or memory size that is absent or zero is "not specified".
/// Existing annotation and ownership values are never overwritten.
pub fn diff_hardware(live: &LiveConfig, desired: &DesiredState) -> Result<HardwareUpdate> {
    let mut update = HardwareUpdate::default();

    if let Some(cpus) = desired.hardware.cpus.filter(|n| *n != 0) {
        if cpus != live.num_cpus {
            debug!(current = live.num_cpus, desired = cpus, "numCPUs changed");
            update.num_cpus = Some(cpus);
        }
    }

    if let Some(memory) = requested_quantity("hardware.memory", desired.hardware.memory.as_ref())? {
        let memory_mb = memory_quantity_to_mb("hardware.memory", &memory)?;
        if memory_mb != live.memory_mb {
            debug!(current = live.memory_mb, desired = memory_mb, "memoryMB changed");
            update.memory_mb = Some(memory_mb);
        }
    }

    if live.annotation.is_empty() {
        update.annotation = desired.annotation.clone().filter(|a| !a.is_empty());
    }

    if live.managed_by.is_none() {
        update.managed_by = desired.managed_by.clone();
    }

    Ok(update)
}
