//! Device inventory reconciliation for vmconfig
//!
//! Matches a desired device list against a VM's live inventory and emits the
//! add/remove operations that converge them. Pure computation, no I/O.

#![deny(missing_docs)]

pub mod ethernet;
pub mod factory;
pub mod matcher;
pub mod pci;
pub mod reconcile;

pub use ethernet::EthernetCardReconciler;
pub use factory::create_pci_devices;
pub use matcher::{match_devices, DeviceMatch};
pub use pci::PciPassthroughReconciler;
pub use reconcile::{DeviceReconciler, KeyAllocator};
