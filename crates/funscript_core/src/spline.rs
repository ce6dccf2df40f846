// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cached timestamp lookup index.
//!
//! The index maps each action's timestamp to its array position. It is a pure
//! cache: any structural change to the action list makes it stale, and a
//! stale index is rebuilt by the next query that wants it. Queries must give
//! the same answers with or without it.

use crate::action::Action;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Timestamp to array position index over a sorted action list
#[derive(Debug, Clone, Default)]
pub enum SplineIndex {
    /// Needs a rebuild before use
    #[default]
    Stale,
    /// Built from the current action list
    Valid {
        /// Timestamp to array position
        map: BTreeMap<i32, usize>,
        /// Length of the action list the map was built from
        len: usize,
    },
}

impl SplineIndex {
    /// Build the index in one pass over sorted actions
    pub fn build(actions: &[Action]) -> Self {
        let map = actions
            .iter()
            .enumerate()
            .map(|(index, action)| (action.at, index))
            .collect();
        Self::Valid {
            map,
            len: actions.len(),
        }
    }

    /// Mark the index stale
    pub fn invalidate(&mut self) {
        *self = Self::Stale;
    }

    /// Whether the index can be queried
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// First position with timestamp >= `time_ms`, `len` if none.
    /// `None` when stale.
    pub fn lower_bound(&self, time_ms: i32) -> Option<usize> {
        match self {
            Self::Stale => None,
            Self::Valid { map, len } => Some(
                map.range(time_ms..)
                    .next()
                    .map_or(*len, |(_, &index)| index),
            ),
        }
    }

    /// First position with timestamp > `time_ms`, `len` if none.
    /// `None` when stale.
    pub fn upper_bound(&self, time_ms: i32) -> Option<usize> {
        match self {
            Self::Stale => None,
            Self::Valid { map, len } => Some(
                map.range((Bound::Excluded(time_ms), Bound::Unbounded))
                    .next()
                    .map_or(*len, |(_, &index)| index),
            ),
        }
    }

    /// Position of the action at exactly `time_ms`
    pub fn find(&self, time_ms: i32) -> Option<usize> {
        match self {
            Self::Stale => None,
            Self::Valid { map, .. } => map.get(&time_ms).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Action> {
        vec![Action::new(0, 0), Action::new(100, 50), Action::new(250, 100)]
    }

    #[test]
    fn test_default_is_stale() {
        let index = SplineIndex::default();
        assert!(!index.is_valid());
        assert_eq!(index.lower_bound(0), None);
        assert_eq!(index.find(0), None);
    }

    #[test]
    fn test_bounds() {
        let index = SplineIndex::build(&sample());
        assert_eq!(index.lower_bound(-10), Some(0));
        assert_eq!(index.lower_bound(100), Some(1));
        assert_eq!(index.lower_bound(101), Some(2));
        assert_eq!(index.lower_bound(251), Some(3));

        assert_eq!(index.upper_bound(100), Some(2));
        assert_eq!(index.upper_bound(99), Some(1));
        assert_eq!(index.upper_bound(250), Some(3));
    }

    #[test]
    fn test_bounds_match_partition_point() {
        let actions = sample();
        let index = SplineIndex::build(&actions);
        for t in -50..300 {
            assert_eq!(
                index.lower_bound(t),
                Some(actions.partition_point(|a| a.at < t))
            );
            assert_eq!(
                index.upper_bound(t),
                Some(actions.partition_point(|a| a.at <= t))
            );
        }
    }

    #[test]
    fn test_invalidate() {
        let mut index = SplineIndex::build(&sample());
        assert_eq!(index.find(250), Some(2));
        index.invalidate();
        assert!(!index.is_valid());
        assert_eq!(index.find(250), None);
    }
}
