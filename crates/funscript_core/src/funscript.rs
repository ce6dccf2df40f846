// SPDX-License-Identifier: MIT OR Apache-2.0
//! The script document and its action store.
//!
//! [`Funscript`] owns the sorted action list, the selection, the lookup index
//! and the pending change flags. Queries, selection operations and the edit
//! facade are implemented on it in their own modules.

use crate::action::{is_strictly_sorted, Action, FunscriptData};
use crate::error::{Error, Result};
use crate::events::{ChangeFlags, FunscriptEvent};
use crate::metadata::{is_canonical_field, Metadata};
use crate::spline::SplineIndex;
use serde_json::{Map, Value};
use std::cell::RefCell;

/// An editable funscript
#[derive(Debug, Clone)]
pub struct Funscript {
    /// Actions and selection
    pub(crate) data: FunscriptData,
    /// Lazily rebuilt lookup index
    spline: RefCell<SplineIndex>,
    /// Whether queries may use the index
    spline_enabled: bool,
    /// Pending change notifications
    pub(crate) flags: ChangeFlags,
    /// Descriptive metadata
    pub metadata: Metadata,
    /// Foreign top-level fields from the loaded document
    base: Map<String, Value>,
}

impl Funscript {
    /// Create an empty script
    pub fn new() -> Self {
        Self {
            data: FunscriptData::new(),
            spline: RefCell::new(SplineIndex::Stale),
            spline_enabled: true,
            flags: ChangeFlags::default(),
            metadata: Metadata::default(),
            base: Map::new(),
        }
    }

    /// Create a script from a list of actions
    pub fn with_actions(actions: impl IntoIterator<Item = Action>) -> Self {
        let mut script = Self::new();
        script.set_actions(actions);
        script
    }

    /// Get all actions
    pub fn actions(&self) -> &[Action] {
        &self.data.actions
    }

    /// Get action count
    pub fn len(&self) -> usize {
        self.data.actions.len()
    }

    /// Check if the script has no actions
    pub fn is_empty(&self) -> bool {
        self.data.actions.is_empty()
    }

    /// Get the actions and selection together
    pub fn data(&self) -> &FunscriptData {
        &self.data
    }

    /// Timestamp of the last action
    pub fn duration_ms(&self) -> i32 {
        self.data.actions.last().map_or(0, |a| a.at)
    }

    /// Enable or disable the lookup index.
    ///
    /// Disabling it only changes query cost, never results.
    pub fn set_spline_enabled(&mut self, enabled: bool) {
        self.spline_enabled = enabled;
        if !enabled {
            self.spline.get_mut().invalidate();
        }
    }

    /// Whether queries use the lookup index
    pub fn spline_enabled(&self) -> bool {
        self.spline_enabled
    }

    /// Whether the lookup index is currently built
    pub fn spline_is_valid(&self) -> bool {
        self.spline.borrow().is_valid()
    }

    /// Foreign top-level fields preserved from the loaded document
    pub fn base_fields(&self) -> &Map<String, Value> {
        &self.base
    }

    /// Replace the preserved foreign fields, dropping any canonical keys
    pub fn set_base_fields(&mut self, mut base: Map<String, Value>) {
        base.retain(|key, _| !is_canonical_field(key));
        self.base = base;
    }

    /// Pending change flags
    pub fn pending_changes(&self) -> ChangeFlags {
        self.flags
    }

    /// Per-tick reconciliation.
    ///
    /// Drains the change flags, rebuilding the lookup index once if the
    /// actions changed, and returns at most one event per flag.
    pub fn update(&mut self) -> Vec<FunscriptEvent> {
        if self.flags.actions_changed {
            debug_assert!(is_strictly_sorted(&self.data.actions));
            if self.spline_enabled {
                *self.spline.get_mut() = SplineIndex::build(&self.data.actions);
            }
        }
        self.flags.drain()
    }

    /// Replace the action list, sorting it and dropping repeated timestamps.
    ///
    /// The first action seen for a timestamp wins. Actions before 0 ms are
    /// dropped and positions are clamped.
    pub fn set_actions(&mut self, actions: impl IntoIterator<Item = Action>) {
        let mut actions: Vec<Action> = actions
            .into_iter()
            .filter(|a| a.at >= 0)
            .map(|a| a.with_pos(a.pos))
            .collect();
        actions.sort_by_key(|a| a.at);
        let before = actions.len();
        actions.dedup_by_key(|a| a.at);
        if actions.len() != before {
            tracing::warn!(
                "Dropped {} actions with duplicate timestamps",
                before - actions.len()
            );
        }
        self.data.actions = actions;
        self.mark_actions_changed();
        self.prune_invalidated_selection();
    }

    /// Replace the actions and selection with a previously captured state.
    ///
    /// Used by undo and redo. Out-of-order actions are re-sorted and
    /// selected actions missing from the store are dropped.
    pub fn restore(&mut self, data: FunscriptData) {
        self.data = data;
        if !is_strictly_sorted(&self.data.actions) {
            tracing::warn!("Restored state was not sorted");
            self.data.actions.sort_by_key(|a| a.at);
            self.data.actions.dedup_by_key(|a| a.at);
        }
        self.mark_actions_changed();
        self.prune_invalidated_selection();
        self.flags.selection_changed = true;
    }

    pub(crate) fn mark_actions_changed(&mut self) {
        self.spline.get_mut().invalidate();
        self.flags.actions_changed = true;
    }

    pub(crate) fn mark_selection_changed(&mut self) {
        self.flags.selection_changed = true;
    }

    /// Drop selected actions that no longer exist in the store
    pub(crate) fn prune_invalidated_selection(&mut self) {
        let actions = &self.data.actions;
        let before = self.data.selection.len();
        self.data
            .selection
            .retain(|selected| actions.binary_search(selected).is_ok());
        if self.data.selection.len() != before {
            self.mark_selection_changed();
        }
    }

    /// Run a query against the index, rebuilding it first if stale.
    /// Returns `None` when indexing is disabled.
    fn with_spline<R>(&self, f: impl FnOnce(&SplineIndex) -> R) -> Option<R> {
        if !self.spline_enabled {
            return None;
        }
        let mut spline = self.spline.borrow_mut();
        if !spline.is_valid() {
            *spline = SplineIndex::build(&self.data.actions);
        }
        Some(f(&spline))
    }

    /// First array position with timestamp >= `time_ms`
    pub(crate) fn lower_bound(&self, time_ms: i32) -> usize {
        self.with_spline(|spline| spline.lower_bound(time_ms))
            .flatten()
            .unwrap_or_else(|| self.data.actions.partition_point(|a| a.at < time_ms))
    }

    /// First array position with timestamp > `time_ms`
    pub(crate) fn upper_bound(&self, time_ms: i32) -> usize {
        self.with_spline(|spline| spline.upper_bound(time_ms))
            .flatten()
            .unwrap_or_else(|| self.data.actions.partition_point(|a| a.at <= time_ms))
    }

    /// Array position of the value-equal action
    pub(crate) fn index_of(&self, action: &Action) -> Option<usize> {
        let index = match self.with_spline(|spline| spline.find(action.at)) {
            Some(found) => found,
            None => self
                .data
                .actions
                .binary_search_by_key(&action.at, |a| a.at)
                .ok(),
        };
        index.filter(|&i| self.data.actions[i] == *action)
    }

    /// Insert keeping the sort order. O(log n) locate, O(n) shift.
    pub(crate) fn insert_action(&mut self, action: Action) -> Result<usize> {
        if action.at < 0 {
            return Err(Error::NegativeTimestamp { at: action.at });
        }
        let action = action.with_pos(action.pos);
        let index = self.data.actions.partition_point(|a| a.at < action.at);
        if self
            .data
            .actions
            .get(index)
            .is_some_and(|existing| existing.at == action.at)
        {
            return Err(Error::DuplicateTimestamp { at: action.at });
        }
        self.data.actions.insert(index, action);
        self.mark_actions_changed();
        Ok(index)
    }

    /// Swap a set of actions for replacements in one step.
    ///
    /// The replacements are checked against the remaining actions and each
    /// other first; on a timestamp collision nothing is changed.
    pub(crate) fn replace_actions(&mut self, old: &[Action], new: &[Action]) -> Result<()> {
        let mut old_sorted = old.to_vec();
        old_sorted.sort_unstable();

        let mut remaining: Vec<Action> = self
            .data
            .actions
            .iter()
            .copied()
            .filter(|a| old_sorted.binary_search(a).is_err())
            .collect();

        let mut replacements = new.to_vec();
        replacements.sort_unstable_by_key(|a| a.at);
        if let Some(pair) = replacements.windows(2).find(|w| w[0].at == w[1].at) {
            return Err(Error::DuplicateTimestamp { at: pair[1].at });
        }
        if let Some(clash) = replacements
            .iter()
            .find(|a| remaining.binary_search_by_key(&a.at, |r| r.at).is_ok())
        {
            return Err(Error::DuplicateTimestamp { at: clash.at });
        }

        remaining.extend(replacements);
        remaining.sort_unstable_by_key(|a| a.at);
        self.data.actions = remaining;
        self.mark_actions_changed();
        Ok(())
    }
}

impl Default for Funscript {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_actions_sorts_and_dedups() {
        let script = Funscript::with_actions([
            Action::new(300, 10),
            Action::new(100, 20),
            Action::new(300, 99),
            Action::new(200, 30),
        ]);
        let times: Vec<i32> = script.actions().iter().map(|a| a.at).collect();
        assert_eq!(times, vec![100, 200, 300]);
        assert_eq!(script.actions()[2].pos, 10);
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let mut script = Funscript::new();
        assert_eq!(script.insert_action(Action::new(1000, 50)), Ok(0));
        assert_eq!(
            script.insert_action(Action::new(1000, 20)),
            Err(Error::DuplicateTimestamp { at: 1000 })
        );
        assert_eq!(script.len(), 1);
    }

    #[test]
    fn test_insert_validates_action() {
        let mut script = Funscript::new();
        assert_eq!(
            script.insert_action(Action { at: -5, pos: 500 }),
            Err(Error::NegativeTimestamp { at: -5 })
        );
        assert_eq!(script.insert_action(Action { at: 0, pos: 500 }), Ok(0));
        assert_eq!(script.actions(), &[Action::new(0, 100)]);

        script.set_actions([Action { at: -1, pos: 0 }, Action { at: 10, pos: -20 }]);
        assert_eq!(script.actions(), &[Action::new(10, 0)]);
    }

    #[test]
    fn test_mutation_invalidates_index() {
        let mut script = Funscript::with_actions([Action::new(0, 0), Action::new(100, 100)]);
        assert_eq!(script.lower_bound(50), 1);
        assert!(script.spline_is_valid());

        script.insert_action(Action::new(50, 50)).unwrap();
        assert!(!script.spline_is_valid());
        assert_eq!(script.lower_bound(50), 1);
        assert_eq!(script.upper_bound(50), 2);
    }

    #[test]
    fn test_update_coalesces_flags() {
        let mut script = Funscript::new();
        script.insert_action(Action::new(0, 0)).unwrap();
        script.insert_action(Action::new(10, 10)).unwrap();
        script.insert_action(Action::new(20, 20)).unwrap();

        assert_eq!(script.update(), vec![FunscriptEvent::ActionsChanged]);
        assert!(script.spline_is_valid());
        assert!(script.update().is_empty());
    }

    #[test]
    fn test_index_of_requires_value_match() {
        let script = Funscript::with_actions([Action::new(0, 0), Action::new(100, 100)]);
        assert_eq!(script.index_of(&Action::new(100, 100)), Some(1));
        assert_eq!(script.index_of(&Action::new(100, 99)), None);
    }

    #[test]
    fn test_replace_actions_is_atomic() {
        let mut script = Funscript::with_actions([
            Action::new(0, 0),
            Action::new(100, 100),
            Action::new(200, 0),
        ]);
        let before = script.data().clone();
        let result = script.replace_actions(&[Action::new(0, 0)], &[Action::new(200, 50)]);
        assert_eq!(result, Err(Error::DuplicateTimestamp { at: 200 }));
        assert_eq!(script.data(), &before);

        script
            .replace_actions(&[Action::new(0, 0)], &[Action::new(150, 50)])
            .unwrap();
        let times: Vec<i32> = script.actions().iter().map(|a| a.at).collect();
        assert_eq!(times, vec![100, 150, 200]);
    }

    #[test]
    fn test_base_fields_drop_canonical_keys() {
        let mut script = Funscript::new();
        let mut base = Map::new();
        base.insert("actions".into(), Value::Array(Vec::new()));
        base.insert("chapters".into(), Value::Array(Vec::new()));
        script.set_base_fields(base);
        assert!(script.base_fields().contains_key("chapters"));
        assert!(!script.base_fields().contains_key("actions"));
    }
}
