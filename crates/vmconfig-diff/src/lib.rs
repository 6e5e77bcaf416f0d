//! Configuration diff engine for vmconfig
//!
//! Per-attribute diff functions over a live snapshot and a desired bundle, and
//! the `ConfigSpecCompiler` that assembles their results into one change-set.
//! Every function is pure: inputs are borrowed and never mutated.

#![deny(missing_docs)]

pub mod allocation;
pub mod change_tracking;
pub mod compiler;
pub mod device_groups;
pub mod extra_config;
pub mod firmware;
pub mod hardware;

pub use allocation::{diff_cpu_allocation, diff_memory_allocation};
pub use change_tracking::diff_change_tracking;
pub use compiler::ConfigSpecCompiler;
pub use device_groups::diff_device_groups;
pub use extra_config::{diff_extra_config, diff_overlay, merge_layers, overlay_layers, OverlayLayer};
pub use firmware::diff_firmware;
pub use hardware::{diff_hardware, HardwareUpdate};
