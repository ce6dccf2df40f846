// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edit facade.
//!
//! These are the operations external callers use. Each call either applies
//! completely or returns an error with the script unchanged, and raises the
//! change flags that the next [`Funscript::update`] drains.

use crate::action::{clamp_position, Action};
use crate::error::{Error, Result};
use crate::funscript::Funscript;
use std::collections::HashSet;

impl Funscript {
    /// Add an action unless its timestamp is taken
    pub fn add_action(&mut self, action: Action) -> Result<()> {
        match self.insert_action(action) {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::warn!("Failed to add action at {} ms: {}", action.at, err);
                Err(err)
            }
        }
    }

    /// Merge a batch of actions into the script, returning how many were added.
    ///
    /// With `check_duplicates` an action equal to an existing one is skipped
    /// quietly. Either way a batch action whose timestamp is already taken
    /// never enters the script.
    pub fn add_action_range(&mut self, range: &[Action], check_duplicates: bool) -> usize {
        let mut taken: HashSet<i32> = self.data.actions.iter().map(|a| a.at).collect();
        let mut added = Vec::with_capacity(range.len());
        let mut rejected = 0usize;

        for action in range {
            if action.at < 0 {
                rejected += 1;
                continue;
            }
            if check_duplicates && self.index_of(action).is_some() {
                continue;
            }
            if taken.insert(action.at) {
                added.push(*action);
            } else {
                rejected += 1;
            }
        }
        if rejected > 0 {
            tracing::warn!("Skipped {rejected} actions on negative or occupied timestamps");
        }
        if added.is_empty() {
            return 0;
        }

        let count = added.len();
        self.data
            .actions
            .extend(added.into_iter().map(|a| a.with_pos(a.pos)));
        self.data.actions.sort_unstable_by_key(|a| a.at);
        self.mark_actions_changed();
        count
    }

    /// Rewrite an existing action.
    ///
    /// A timestamp change re-inserts the action so the order holds. The
    /// action stays selected if it was selected before.
    pub fn edit_action(&mut self, old: Action, new: Action) -> Result<()> {
        let Some(index) = self.index_of(&old) else {
            return Err(Error::NotFound { action: old });
        };
        let new = new.with_pos(new.pos);
        if old == new {
            return Ok(());
        }

        if old.at == new.at {
            // Same slot: the index stays valid.
            self.data.actions[index] = new;
            self.flags.actions_changed = true;
        } else {
            if new.at < 0 {
                return Err(Error::NegativeTimestamp { at: new.at });
            }
            if self.index_of_time(new.at).is_some() {
                return Err(Error::DuplicateTimestamp { at: new.at });
            }
            self.data.actions.remove(index);
            self.mark_actions_changed();
            self.insert_action(new)?;
        }

        if let Ok(selected) = self.data.selection.binary_search(&old) {
            self.data.selection.remove(selected);
            let slot = self.data.selection.partition_point(|s| s < &new);
            self.data.selection.insert(slot, new);
            self.mark_selection_changed();
        }
        Ok(())
    }

    /// Overwrite the closest action within `tolerance_ms`, or add a new one
    pub fn add_edit_action(&mut self, action: Action, tolerance_ms: u32) -> Result<()> {
        match self.action_near(action.at, tolerance_ms) {
            Some(close) => self.edit_action(close, action),
            None => self.add_action(action),
        }
    }

    /// Paste an action, replacing whatever is within `tolerance_ms` of it
    pub fn paste_action(&mut self, action: Action, tolerance_ms: u32) -> Result<()> {
        if action.at < 0 {
            return Err(Error::NegativeTimestamp { at: action.at });
        }
        if let Some(close) = self.action_near(action.at, tolerance_ms) {
            if let Some(index) = self.index_of(&close) {
                self.data.actions.remove(index);
                self.mark_actions_changed();
            }
        }
        // Anything on the same timestamp was the closest action and is gone.
        let result = self.insert_action(action).map(|_| ());
        self.prune_invalidated_selection();
        result
    }

    /// Remove an action by value
    pub fn remove_action(&mut self, action: Action) -> Result<()> {
        let Some(index) = self.index_of(&action) else {
            return Err(Error::NotFound { action });
        };
        self.data.actions.remove(index);
        self.mark_actions_changed();
        self.prune_invalidated_selection();
        Ok(())
    }

    /// Remove a batch of actions by value, returning how many were found
    pub fn remove_actions(&mut self, actions: &[Action]) -> usize {
        let remove: HashSet<Action> = actions.iter().copied().collect();
        let before = self.data.actions.len();
        self.data.actions.retain(|a| !remove.contains(a));
        let removed = before - self.data.actions.len();
        if removed > 0 {
            self.mark_actions_changed();
            self.prune_invalidated_selection();
        }
        removed
    }

    /// Remove every action with a timestamp in `[from_ms, to_ms]`
    pub fn remove_actions_in_interval(&mut self, from_ms: i32, to_ms: i32) -> Result<usize> {
        if from_ms > to_ms {
            return Err(Error::InvalidInterval {
                from: from_ms,
                to: to_ms,
            });
        }
        let start = self.lower_bound(from_ms);
        let end = self.upper_bound(to_ms);
        if start == end {
            return Ok(0);
        }
        self.data.actions.drain(start..end);
        self.mark_actions_changed();
        self.prune_invalidated_selection();
        Ok(end - start)
    }

    /// Shift the selected actions in time.
    ///
    /// With everything selected the whole script moves. Otherwise the offset
    /// is clamped so the block stops `min_spacing_ms` short of the nearest
    /// unselected action in the direction of travel. Nothing moves below
    /// timestamp 0 or past `i32::MAX`.
    pub fn move_selection_time(&mut self, offset_ms: i32, min_spacing_ms: i32) -> Result<()> {
        let (Some(&first), Some(&last)) = (self.data.selection.first(), self.data.selection.last())
        else {
            return Ok(());
        };

        let mut offset = offset_ms.max(-first.at).min(i32::MAX - last.at);
        if self.data.selection.len() != self.data.actions.len() {
            if offset > 0 {
                if let Some(next) = self.next_action_after(last.at) {
                    let room = next.at.saturating_sub(min_spacing_ms).saturating_sub(last.at);
                    offset = offset.min(room).max(0);
                }
            } else if offset < 0 {
                if let Some(prev) = self.previous_action_before(first.at) {
                    let room = prev.at.saturating_add(min_spacing_ms).saturating_sub(first.at);
                    offset = offset.max(room).min(0);
                }
            }
        }
        if offset == 0 {
            return Ok(());
        }

        let selection = self.data.selection.clone();
        let moved: Vec<Action> = selection.iter().map(|a| a.with_at(a.at + offset)).collect();
        self.replace_actions(&selection, &moved)?;
        self.data.selection = moved;
        self.mark_selection_changed();
        Ok(())
    }

    /// Shift the selected positions, clamped to 0..=100
    pub fn move_selection_position(&mut self, offset: i32) -> Result<()> {
        if self.data.selection.is_empty() || offset == 0 {
            return Ok(());
        }
        let selection = self.data.selection.clone();
        let moved: Vec<Action> = selection
            .iter()
            .map(|a| Action {
                at: a.at,
                pos: clamp_position(a.pos.saturating_add(offset)),
            })
            .collect();
        self.replace_actions(&selection, &moved)?;
        self.data.selection = moved;
        self.mark_selection_changed();
        Ok(())
    }

    fn index_of_time(&self, time_ms: i32) -> Option<usize> {
        let index = self.lower_bound(time_ms);
        self.data
            .actions
            .get(index)
            .filter(|a| a.at == time_ms)
            .map(|_| index)
    }
}
