//! Stale artifact detection.
//!
//! Every save records the keys it materialized as [`Baselines`]. The next
//! save diffs its own keys against them:
//!
//! - a group name that disappeared removes the group's whole folder, which
//!   takes every dialogue inside it along
//! - a node name that disappeared from a group that still exists removes
//!   just that dialogue
//! - an ungrouped node name that disappeared removes that dialogue
//!
//! Dialogues of a removed group are never diffed one by one; the folder
//! removal already covers them. The diff is a pure function of the two key
//! sets, so it can be planned before anything is written.

use std::collections::BTreeSet;

use colloquy_core::record::{Baselines, EntityRef};

use crate::{changeset::Removal, layout::AssetLayout};

/// The outcome of diffing two baselines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    removals: Vec<Removal>,
    baselines: Baselines,
}

impl Reconciliation {
    /// Removals to stage, ungrouped dialogues first, group folders last.
    pub fn removals(&self) -> &[Removal] {
        &self.removals
    }

    /// The baselines to persist with the document.
    pub fn baselines(&self) -> &Baselines {
        &self.baselines
    }

    pub fn into_parts(self) -> (Vec<Removal>, Baselines) {
        (self.removals, self.baselines)
    }
}

fn removed<'a>(
    previous: &'a BTreeSet<String>,
    current: &'a BTreeSet<String>,
) -> impl Iterator<Item = &'a str> {
    previous.difference(current).map(String::as_str)
}

/// Diffs `current` against `previous` and plans the removals.
///
/// `current` becomes the new baseline as-is.
pub fn reconcile(layout: &AssetLayout, previous: &Baselines, current: Baselines) -> Reconciliation {
    let mut removals = Vec::new();

    for name in removed(&previous.ungrouped_node_names, &current.ungrouped_node_names) {
        removals.push(Removal::Asset(layout.dialogue(&EntityRef::ungrouped(name))));
    }

    let empty = BTreeSet::new();
    for (group, names) in &current.grouped_node_names {
        let before = previous.grouped_node_names.get(group).unwrap_or(&empty);
        for name in removed(before, names) {
            removals.push(Removal::Asset(
                layout.dialogue(&EntityRef::grouped(group.as_str(), name)),
            ));
        }
    }

    for group in removed(&previous.group_names, &current.group_names) {
        removals.push(Removal::Folder(layout.group_folder(group)));
    }

    Reconciliation {
        removals,
        baselines: current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{config::LayoutConfig, layout::AssetPath};

    fn layout() -> AssetLayout {
        AssetLayout::new(&LayoutConfig::new("G", "D"), "Q").unwrap()
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn baselines(groups: &[(&str, &[&str])], ungrouped: &[&str]) -> Baselines {
        Baselines {
            group_names: groups.iter().map(|(g, _)| g.to_string()).collect(),
            grouped_node_names: groups
                .iter()
                .map(|(g, names)| (g.to_string(), set(names)))
                .collect(),
            ungrouped_node_names: set(ungrouped),
        }
    }

    fn paths(reconciliation: &Reconciliation) -> Vec<&str> {
        reconciliation
            .removals()
            .iter()
            .map(|removal| removal.path().as_str())
            .collect()
    }

    #[test]
    fn test_first_save_removes_nothing() {
        let current = baselines(&[("Inn", &["A"])], &["B"]);
        let result = reconcile(&layout(), &Baselines::default(), current.clone());

        assert!(result.removals().is_empty());
        assert_eq!(result.baselines(), &current);
    }

    #[test]
    fn test_removed_ungrouped_and_grouped_nodes() {
        let previous = baselines(&[("Inn", &["A", "B"])], &["X", "Y"]);
        let current = baselines(&[("Inn", &["A"])], &["Y"]);

        let result = reconcile(&layout(), &previous, current);

        assert_eq!(
            paths(&result),
            vec!["D/Q/Global/Dialogues/X", "D/Q/Groups/Inn/Dialogues/B"]
        );
    }

    #[test]
    fn test_removed_group_cascades_as_folder() {
        let previous = baselines(&[("Inn", &["A", "B"]), ("Road", &["C"])], &[]);
        let current = baselines(&[("Road", &["C"])], &[]);

        let result = reconcile(&layout(), &previous, current);

        assert_eq!(
            result.removals(),
            &[Removal::Folder(AssetPath::parse("D/Q/Groups/Inn"))]
        );
    }

    #[test]
    fn test_last_node_of_surviving_group() {
        let previous = baselines(&[("Inn", &["A"])], &[]);
        let current = baselines(&[("Inn", &[])], &[]);

        let result = reconcile(&layout(), &previous, current);

        assert_eq!(paths(&result), vec!["D/Q/Groups/Inn/Dialogues/A"]);
    }

    #[test]
    fn test_node_moved_between_buckets() {
        let previous = baselines(&[("Inn", &["A"])], &[]);
        let current = baselines(&[("Inn", &[])], &["A"]);

        let result = reconcile(&layout(), &previous, current);

        assert_eq!(paths(&result), vec!["D/Q/Groups/Inn/Dialogues/A"]);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;
    use crate::config::LayoutConfig;

    // ===================
    // Strategies
    // ===================

    fn names_strategy() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set("[a-d]", 0..4)
    }

    fn baselines_strategy() -> impl Strategy<Value = Baselines> {
        (
            prop::collection::btree_map("[A-C]", names_strategy(), 0..3),
            names_strategy(),
        )
            .prop_map(|(grouped, ungrouped)| Baselines {
                group_names: grouped.keys().cloned().collect(),
                grouped_node_names: grouped,
                ungrouped_node_names: ungrouped,
            })
    }

    fn layout() -> AssetLayout {
        AssetLayout::new(&LayoutConfig::new("G", "D"), "Q").unwrap()
    }

    fn current_paths(layout: &AssetLayout, keys: &Baselines) -> Vec<crate::layout::AssetPath> {
        let mut paths = Vec::new();
        for (group, names) in &keys.grouped_node_names {
            paths.push(layout.group_entity(group));
            for name in names {
                paths.push(layout.dialogue(&EntityRef::grouped(group.as_str(), name.as_str())));
            }
        }
        for name in &keys.ungrouped_node_names {
            paths.push(layout.dialogue(&EntityRef::ungrouped(name.as_str())));
        }
        paths
    }

    // ===================
    // Property Test Functions
    // ===================

    /// No removal may touch an artifact of the current snapshot.
    fn check_current_artifacts_survive(
        previous: Baselines,
        current: Baselines,
    ) -> Result<(), TestCaseError> {
        let layout = layout();
        let survivors = current_paths(&layout, &current);
        let result = reconcile(&layout, &previous, current);

        for removal in result.removals() {
            for path in &survivors {
                prop_assert!(
                    !path.is_within(removal.path()),
                    "{removal:?} would delete current artifact {path}"
                );
            }
        }
        Ok(())
    }

    /// Every artifact of the previous save that is no longer current is removed.
    fn check_stale_artifacts_removed(
        previous: Baselines,
        current: Baselines,
    ) -> Result<(), TestCaseError> {
        let layout = layout();
        let before = current_paths(&layout, &previous);
        let after = current_paths(&layout, &current);
        let result = reconcile(&layout, &previous, current);

        for path in before.iter().filter(|path| !after.contains(path)) {
            prop_assert!(
                result
                    .removals()
                    .iter()
                    .any(|removal| path.is_within(removal.path())),
                "stale artifact {path} is not removed"
            );
        }
        Ok(())
    }

    /// Reconciling a baseline against itself plans nothing.
    fn check_idempotent(keys: Baselines) -> Result<(), TestCaseError> {
        let result = reconcile(&layout(), &keys, keys.clone());

        prop_assert!(result.removals().is_empty());
        prop_assert_eq!(result.baselines(), &keys);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn current_artifacts_survive(previous in baselines_strategy(), current in baselines_strategy()) {
            check_current_artifacts_survive(previous, current)?;
        }

        #[test]
        fn stale_artifacts_removed(previous in baselines_strategy(), current in baselines_strategy()) {
            check_stale_artifacts_removed(previous, current)?;
        }

        #[test]
        fn reconcile_is_idempotent(keys in baselines_strategy()) {
            check_idempotent(keys)?;
        }
    }
}
