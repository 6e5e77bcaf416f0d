//! Greedy bipartite device matching
//!
//! Each desired device, in list order, claims the first remaining current device
//! the predicate accepts. Matching is driven by content, so the result does not
//! depend on where a device sits in either list, and a current device is never
//! claimed twice.

use tracing::trace;

/// Outcome of matching a desired device list against a current one
#[derive(Debug)]
pub struct DeviceMatch<'a, T> {
    /// `(desired, current)` pairs that need no operation
    pub matched: Vec<(&'a T, &'a T)>,
    /// Desired devices with no counterpart, in desired-list order
    pub unmatched_desired: Vec<&'a T>,
    /// Current devices nothing claimed, in current-list order
    pub unmatched_current: Vec<&'a T>,
}

impl<T> DeviceMatch<'_, T> {
    /// Returns true if every device on both sides found a partner
    pub fn is_converged(&self) -> bool {
        self.unmatched_desired.is_empty() && self.unmatched_current.is_empty()
    }
}

/// Match `desired` against `current` under the equivalence predicate `eq`
///
/// `eq` receives `(desired, current)` and must ignore identity keys.
pub fn match_devices<'a, T, F>(
    desired: impl IntoIterator<Item = &'a T>,
    current: impl IntoIterator<Item = &'a T>,
    mut eq: F,
) -> DeviceMatch<'a, T>
where
    T: 'a,
    F: FnMut(&T, &T) -> bool,
{
    let mut pool: Vec<Option<&'a T>> = current.into_iter().map(Some).collect();
    let mut matched = Vec::new();
    let mut unmatched_desired = Vec::new();

    for want in desired {
        let hit = pool
            .iter_mut()
            .find(|slot| slot.is_some_and(|have| eq(want, have)))
            .and_then(Option::take);

        match hit {
            Some(have) => {
                trace!(position = matched.len(), "device matched");
                matched.push((want, have));
            }
            None => {
                trace!(position = unmatched_desired.len(), "desired device unmatched");
                unmatched_desired.push(want);
            }
        }
    }

    DeviceMatch {
        matched,
        unmatched_desired,
        unmatched_current: pool.into_iter().flatten().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// (identity key, content)
    type Dev = (i32, &'static str);

    fn by_content(a: &Dev, b: &Dev) -> bool {
        a.1 == b.1
    }

    #[test]
    fn empty_inputs_match_nothing() {
        let none: Vec<Dev> = vec![];
        let m = match_devices(&none, &none, by_content);
        assert!(m.matched.is_empty());
        assert!(m.is_converged());
    }

    #[test]
    fn all_desired_unmatched_against_empty_current() {
        let desired = vec![(-1, "a"), (-2, "a")];
        let current: Vec<Dev> = vec![];
        let m = match_devices(&desired, &current, by_content);
        assert_eq!(m.unmatched_desired, vec![&(-1, "a"), &(-2, "a")]);
        assert!(m.unmatched_current.is_empty());
    }

    #[test]
    fn keys_are_ignored_and_pairs_keep_live_device() {
        let desired = vec![(-100, "a")];
        let current = vec![(4000, "a")];
        let m = match_devices(&desired, &current, by_content);
        assert_eq!(m.matched, vec![(&(-100, "a"), &(4000, "a"))]);
        assert!(m.is_converged());
    }

    #[test]
    fn current_device_is_never_claimed_twice() {
        let desired = vec![(-1, "a"), (-2, "a")];
        let current = vec![(1, "a")];
        let m = match_devices(&desired, &current, by_content);
        assert_eq!(m.matched.len(), 1);
        assert_eq!(m.unmatched_desired, vec![&(-2, "a")]);
        assert!(m.unmatched_current.is_empty());
    }

    #[test]
    fn first_remaining_current_device_wins() {
        let desired = vec![(-1, "a")];
        let current = vec![(1, "b"), (2, "a"), (3, "a")];
        let m = match_devices(&desired, &current, by_content);
        assert_eq!(m.matched, vec![(&(-1, "a"), &(2, "a"))]);
        assert_eq!(m.unmatched_current, vec![&(1, "b"), &(3, "a")]);
    }

    #[rstest]
    #[case(vec![(-1, "a"), (-2, "b"), (-3, "c")], vec![(1, "c"), (2, "a"), (3, "b")])]
    #[case(vec![(-3, "c"), (-2, "b"), (-1, "a")], vec![(2, "a"), (3, "b"), (1, "c")])]
    #[case(vec![(-1, "a"), (-2, "a")], vec![(7, "a"), (8, "a")])]
    fn reordering_does_not_create_churn(#[case] desired: Vec<Dev>, #[case] current: Vec<Dev>) {
        let m = match_devices(&desired, &current, by_content);
        assert!(m.is_converged());
        assert_eq!(m.matched.len(), desired.len());
    }
}
