//! Device-group topology

use tracing::debug;
use vmconfig_common::model::{ClassConfigOverride, DeviceGroups};

/// Return the class-supplied device-group topology, if any
///
/// The class topology replaces the live one whenever it is present and
/// non-empty; it is not compared against the live topology. Without a class
/// topology nothing is emitted, so a live topology is never cleared.
pub fn diff_device_groups(class: Option<&ClassConfigOverride>) -> Option<DeviceGroups> {
    let groups = class?.device_groups.as_ref().filter(|g| !g.is_empty())?;
    debug!(groups = groups.device_group.len(), "deviceGroups overwritten");
    Some(groups.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmconfig_common::model::DeviceGroup;

    fn groups(key: i32) -> DeviceGroups {
        DeviceGroups {
            device_group: vec![DeviceGroup {
                group_instance_key: key,
                device_group_name: None,
                vendor_name: None,
            }],
        }
    }

    #[test]
    fn no_class_groups_emits_nothing() {
        assert_eq!(diff_device_groups(None), None);
        assert_eq!(diff_device_groups(Some(&ClassConfigOverride::default())), None);

        let empty = ClassConfigOverride {
            device_groups: Some(DeviceGroups::default()),
            ..Default::default()
        };
        assert_eq!(diff_device_groups(Some(&empty)), None);
    }

    #[test]
    fn class_groups_are_emitted_verbatim() {
        let class = ClassConfigOverride {
            device_groups: Some(groups(400)),
            ..Default::default()
        };
        let emitted = diff_device_groups(Some(&class)).unwrap();
        assert_eq!(emitted.device_group.len(), 1);
        assert_eq!(emitted.device_group[0].group_instance_key, 400);
    }
}
