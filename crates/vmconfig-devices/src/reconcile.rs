//! Device-family reconciliation
//!
//! A family supplies three things: which live devices it owns, which desired
//! devices it can express, and when two devices are equivalent. The shared
//! `reconcile` turns a match into operations: removals of unclaimed live devices
//! in live order, then additions of unmatched desired devices in desired order.

use std::collections::BTreeSet;

use tracing::debug;
use vmconfig_common::model::{DeviceChange, DeviceKey, VirtualDevice};
use vmconfig_common::Result;

use crate::matcher::match_devices;

/// Hands out identity keys for added devices
///
/// A proposed key is kept unless it is already used by a live device or by an
/// earlier addition; otherwise the next free negative key is assigned. Keys
/// proposed by not-yet-emitted additions are never handed out as fresh keys.
#[derive(Debug, Clone)]
pub struct KeyAllocator {
    taken: BTreeSet<DeviceKey>,
    reserved: BTreeSet<DeviceKey>,
    next: DeviceKey,
}

impl KeyAllocator {
    /// Create an allocator seeded with the keys of the live inventory
    pub fn new(live: &[VirtualDevice]) -> Self {
        Self {
            taken: live.iter().map(|d| d.key).collect(),
            reserved: BTreeSet::new(),
            next: -1,
        }
    }

    /// Keep these proposed keys out of the fresh-key pool
    pub fn reserve(&mut self, keys: impl IntoIterator<Item = DeviceKey>) {
        self.reserved.extend(keys);
    }

    /// Return a key for an addition that proposed `key`
    pub fn claim(&mut self, key: DeviceKey) -> DeviceKey {
        if self.taken.insert(key) {
            return key;
        }
        while self.taken.contains(&self.next) || self.reserved.contains(&self.next) {
            self.next -= 1;
        }
        let fresh = self.next;
        self.taken.insert(fresh);
        fresh
    }
}

/// Reconciles one device family between a desired list and the live inventory
pub trait DeviceReconciler {
    /// Family name used in logs and errors ("ethernet", "pci")
    fn family(&self) -> &'static str;

    /// Returns true if a live device belongs to this family
    ///
    /// Devices of other families are invisible to the reconciler and are
    /// never removed by it.
    fn claims(&self, device: &VirtualDevice) -> bool;

    /// Reject desired devices this family cannot construct
    fn validate(&self, device: &VirtualDevice) -> Result<()>;

    /// Equivalence predicate; must ignore identity keys
    fn equivalent(&self, desired: &VirtualDevice, current: &VirtualDevice) -> bool;

    /// Compute operations with a fresh key allocator over `live`
    fn reconcile(
        &self,
        desired: &[VirtualDevice],
        live: &[VirtualDevice],
    ) -> Result<Vec<DeviceChange>> {
        let mut keys = KeyAllocator::new(live);
        keys.reserve(desired.iter().map(|d| d.key));
        self.reconcile_with(desired, live, &mut keys)
    }

    /// Compute operations, drawing keys for additions from `keys`
    ///
    /// Every desired device is validated before any operation is produced, so
    /// an error never leaves a partial operation list behind.
    fn reconcile_with(
        &self,
        desired: &[VirtualDevice],
        live: &[VirtualDevice],
        keys: &mut KeyAllocator,
    ) -> Result<Vec<DeviceChange>> {
        for device in desired {
            self.validate(device)?;
        }

        let current = live.iter().filter(|d| self.claims(d));
        let m = match_devices(desired, current, |want, have| self.equivalent(want, have));

        let family = self.family();
        let mut changes = Vec::with_capacity(m.unmatched_current.len() + m.unmatched_desired.len());

        for device in m.unmatched_current {
            debug!(family, key = device.key, device = device.type_name(), "removing device");
            changes.push(DeviceChange::Remove { key: device.key });
        }

        for device in m.unmatched_desired {
            let mut device = device.clone();
            let key = keys.claim(device.key);
            if key != device.key {
                debug!(family, proposed = device.key, key, "re-keyed added device");
                device.key = key;
            }
            debug!(family, key, device = device.type_name(), "adding device");
            changes.push(DeviceChange::Add { device });
        }

        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposed_key_kept_when_free() {
        let mut keys = KeyAllocator::new(&[VirtualDevice::other(4000, "disk")]);
        assert_eq!(keys.claim(100), 100);
        assert_eq!(keys.claim(-200), -200);
    }

    #[test]
    fn colliding_key_gets_fresh_negative_key() {
        let live = [
            VirtualDevice::other(0, "ide"),
            VirtualDevice::other(-1, "pending"),
        ];
        let mut keys = KeyAllocator::new(&live);
        keys.reserve([-2]);
        assert_eq!(keys.claim(0), -3);
        assert_eq!(keys.claim(-2), -2);
        // repeated proposal collides with the earlier addition
        assert_eq!(keys.claim(-2), -4);
    }
}
