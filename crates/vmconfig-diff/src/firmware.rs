//! Firmware override

use tracing::debug;
use vmconfig_common::model::Firmware;

/// Diff the firmware kind against an annotation-supplied override
///
/// Unrecognized override values are ignored and the live firmware is kept.
pub fn diff_firmware(live: Option<Firmware>, override_value: Option<&str>) -> Option<Firmware> {
    let raw = override_value?;
    let firmware = match raw.parse::<Firmware>() {
        Ok(firmware) => firmware,
        Err(reason) => {
            debug!(value = raw, %reason, "ignoring firmware override");
            return None;
        }
    };

    if live == Some(firmware) {
        return None;
    }
    debug!(current = ?live, desired = %firmware, "firmware changed");
    Some(firmware)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::no_override(None, None)]
    #[case::same_as_live(Some("bios"), None)]
    #[case::differs(Some("efi"), Some(Firmware::Efi))]
    #[case::invalid(Some("invalidfirmware"), None)]
    fn firmware_override(#[case] value: Option<&str>, #[case] expected: Option<Firmware>) {
        assert_eq!(diff_firmware(Some(Firmware::Bios), value), expected);
    }

    #[test]
    fn unknown_live_firmware_takes_override() {
        assert_eq!(diff_firmware(None, Some("bios")), Some(Firmware::Bios));
    }
}
