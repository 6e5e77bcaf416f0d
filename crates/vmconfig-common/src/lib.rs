//! Common types for vmconfig: the live/desired/change-set model, quantities, and errors
//!
//! Everything in this crate is plain data. The diff engine (`vmconfig-diff`) and the
//! device reconcilers (`vmconfig-devices`) are pure functions over these types.

#![deny(missing_docs)]

pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod quantity;
pub mod telemetry;

pub use config::{EngineConfig, FeatureGates};
pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
