//! Changed-block tracking flag

use tracing::debug;
use vmconfig_common::model::{AdvancedOptions, ClassConfigOverride};
use vmconfig_common::FeatureGates;

/// Diff the changed-block tracking flag
///
/// With the day-N gate on and a class value present, the class value is the
/// intent and the VM's advanced option is ignored. Otherwise the advanced
/// option is the intent. No intent, no change. An unset live flag differs
/// from any intent.
pub fn diff_change_tracking(
    live: Option<bool>,
    class: Option<&ClassConfigOverride>,
    advanced: &AdvancedOptions,
    gates: &FeatureGates,
) -> Option<bool> {
    let class_value = class
        .and_then(|c| c.change_tracking_enabled)
        .filter(|_| gates.vm_class_as_config_day_n_date);

    let (source, desired) = match class_value {
        Some(v) => ("class", v),
        None => ("advancedOptions", advanced.change_block_tracking?),
    };

    if live == Some(desired) {
        return None;
    }
    debug!(source, current = ?live, desired, "changeTrackingEnabled changed");
    Some(desired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn class(value: bool) -> ClassConfigOverride {
        ClassConfigOverride {
            change_tracking_enabled: Some(value),
            ..Default::default()
        }
    }

    fn advanced(value: Option<bool>) -> AdvancedOptions {
        AdvancedOptions {
            change_block_tracking: value,
        }
    }

    #[rstest]
    #[case::both_unset(None, None, None)]
    #[case::set_false(Some(true), Some(false), Some(false))]
    #[case::set_true(Some(false), Some(true), Some(true))]
    #[case::matches(Some(true), Some(true), None)]
    #[case::live_unset(None, Some(false), Some(false))]
    #[case::no_intent(Some(true), None, None)]
    fn advanced_option_source(
        #[case] live: Option<bool>,
        #[case] intent: Option<bool>,
        #[case] expected: Option<bool>,
    ) {
        let gates = FeatureGates::default();
        assert_eq!(
            diff_change_tracking(live, None, &advanced(intent), &gates),
            expected
        );
    }

    #[test]
    fn class_value_ignored_without_gate() {
        let gates = FeatureGates::default();
        let got = diff_change_tracking(
            Some(false),
            Some(&class(false)),
            &advanced(Some(true)),
            &gates,
        );
        assert_eq!(got, Some(true));
    }

    #[rstest]
    #[case::same_as_live(false, None)]
    #[case::overrides_vm_option(true, Some(true))]
    fn class_value_wins_with_gate(#[case] class_value: bool, #[case] expected: Option<bool>) {
        let gates = FeatureGates {
            vm_class_as_config_day_n_date: true,
            ..Default::default()
        };
        let got = diff_change_tracking(
            Some(false),
            Some(&class(class_value)),
            &advanced(Some(true)),
            &gates,
        );
        assert_eq!(got, expected);
    }

    #[test]
    fn gate_on_without_class_value_falls_back() {
        let gates = FeatureGates::all();
        let empty = ClassConfigOverride::default();
        let got = diff_change_tracking(Some(false), Some(&empty), &advanced(Some(true)), &gates);
        assert_eq!(got, Some(true));
    }
}
