//! Error types for the vmconfig engine
//!
//! The engine performs no I/O, so the taxonomy is narrow: malformed resource
//! quantities and device descriptors the engine cannot express are surfaced to
//! the caller. Unrecognized override values are ignored rather than reported.

use thiserror::Error;

/// Main error type for vmconfig operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A resource quantity could not be parsed or converted
    #[error("invalid quantity for {field} '{value}': {message}")]
    InvalidQuantity {
        /// Field the quantity was read from (e.g., "policies.limits.memory")
        field: String,
        /// The raw quantity string
        value: String,
        /// Description of what's invalid
        message: String,
    },

    /// A desired device cannot be reconciled by its device family
    #[error("unsupported {family} device (key {key}): {message}")]
    UnsupportedDevice {
        /// Device family that rejected the device ("ethernet", "pci")
        family: String,
        /// Identity key of the offending device
        key: i32,
        /// Description of what's unsupported
        message: String,
    },

    /// Engine configuration is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Description of what's invalid
        message: String,
    },
}

impl Error {
    /// Create an invalid quantity error
    pub fn invalid_quantity(
        field: impl Into<String>,
        value: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::InvalidQuantity {
            field: field.into(),
            value: value.into(),
            message: msg.into(),
        }
    }

    /// Create an unsupported device error
    pub fn unsupported_device(family: impl Into<String>, key: i32, msg: impl Into<String>) -> Self {
        Self::UnsupportedDevice {
            family: family.into(),
            key,
            message: msg.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Returns true if the error was caused by malformed caller input
    ///
    /// Both quantity and device errors mean the desired state itself is wrong;
    /// re-running the engine with the same input produces the same error.
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidQuantity { .. } | Self::UnsupportedDevice { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_quantity_display_includes_field_and_value() {
        let err = Error::invalid_quantity("hardware.memory", "12Xi", "unknown suffix");
        assert_eq!(
            err.to_string(),
            "invalid quantity for hardware.memory '12Xi': unknown suffix"
        );
        assert!(err.is_bad_input());
    }

    #[test]
    fn unsupported_device_display() {
        let err = Error::unsupported_device(
            "pci",
            -200,
            "backing VirtualPCIPassthroughDeviceBackingInfo is not managed",
        );
        assert!(err.to_string().starts_with("unsupported pci device (key -200)"));
        assert!(err.is_bad_input());
    }

    #[test]
    fn config_error_is_not_bad_input() {
        assert!(!Error::config("minCpuFreqMhz must be greater than 0").is_bad_input());
    }
}
