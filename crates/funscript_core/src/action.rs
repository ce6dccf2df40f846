// SPDX-License-Identifier: MIT OR Apache-2.0
//! Action definitions for the timeline.

use serde::{Deserialize, Serialize};

/// Lowest position an action can hold
pub const MIN_POSITION: i32 = 0;

/// Highest position an action can hold
pub const MAX_POSITION: i32 = 100;

/// A single point on the motion timeline.
///
/// Actions are plain values: two actions with the same timestamp occupy the
/// same slot, and full equality compares both fields. The derived ordering
/// sorts by timestamp first, which is the order the store keeps them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Action {
    /// Time in milliseconds
    pub at: i32,
    /// Position (0 to 100)
    pub pos: i32,
}

impl Action {
    /// Create a new action, clamping the position into range
    pub fn new(at: i32, pos: i32) -> Self {
        Self {
            at,
            pos: clamp_position(pos),
        }
    }

    /// Copy of this action at another time
    pub fn with_at(self, at: i32) -> Self {
        Self { at, ..self }
    }

    /// Copy of this action at another position (clamped)
    pub fn with_pos(self, pos: i32) -> Self {
        Self {
            pos: clamp_position(pos),
            ..self
        }
    }

    /// Whether two actions occupy the same timestamp slot
    pub fn same_slot(&self, other: &Action) -> bool {
        self.at == other.at
    }
}

/// Clamp a position into the valid 0..=100 range
pub fn clamp_position(pos: i32) -> i32 {
    pos.clamp(MIN_POSITION, MAX_POSITION)
}

/// The editable state of a script: its actions and the current selection.
///
/// `Clone` is a deep copy, which is what undo snapshots rely on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunscriptData {
    /// All actions, strictly increasing by timestamp
    pub actions: Vec<Action>,
    /// Selected actions, a value subset of `actions` in the same order
    pub selection: Vec<Action>,
}

impl FunscriptData {
    /// Create empty script data
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the actions are strictly increasing by timestamp
    pub fn is_sorted(&self) -> bool {
        is_strictly_sorted(&self.actions)
    }

    /// Whether every selected action has a value-equal action in the store
    pub fn selection_is_sound(&self) -> bool {
        is_strictly_sorted(&self.selection)
            && self
                .selection
                .iter()
                .all(|s| self.actions.binary_search(s).is_ok())
    }
}

pub(crate) fn is_strictly_sorted(actions: &[Action]) -> bool {
    actions.windows(2).all(|w| w[0].at < w[1].at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_position() {
        assert_eq!(Action::new(10, 150).pos, 100);
        assert_eq!(Action::new(10, -5).pos, 0);
        assert_eq!(Action::new(10, 42).pos, 42);
    }

    #[test]
    fn test_ordering_is_by_timestamp() {
        let mut actions = vec![Action::new(300, 0), Action::new(100, 90), Action::new(200, 50)];
        actions.sort();
        let times: Vec<i32> = actions.iter().map(|a| a.at).collect();
        assert_eq!(times, vec![100, 200, 300]);
    }

    #[test]
    fn test_same_slot() {
        assert!(Action::new(100, 0).same_slot(&Action::new(100, 99)));
        assert_ne!(Action::new(100, 0), Action::new(100, 99));
    }

    #[test]
    fn test_serialization_field_names() {
        let json = serde_json::to_string(&Action::new(1500, 70)).unwrap();
        assert_eq!(json, r#"{"at":1500,"pos":70}"#);
    }

    #[test]
    fn test_selection_soundness() {
        let mut data = FunscriptData::new();
        data.actions = vec![Action::new(0, 0), Action::new(100, 100)];
        data.selection = vec![Action::new(100, 100)];
        assert!(data.selection_is_sound());

        data.selection = vec![Action::new(100, 50)];
        assert!(!data.selection_is_sound());
    }
}
