// SPDX-License-Identifier: MIT OR Apache-2.0
//! Selection engine.
//!
//! The selection is stored by value, ordered by timestamp, separately from the
//! action store. Any store mutation that can drop a selected action is
//! followed by a prune so the selection never names a missing slot.
//!
//! Pattern operations:
//! - Top / bottom / mid point isolation
//! - Equalize spacing
//! - Invert positions
//! - Range extend per stroke

use crate::action::{clamp_position, Action, MAX_POSITION};
use crate::error::{Error, Result};
use crate::funscript::Funscript;

/// Minimum selection size for the pattern operations
pub const MIN_PATTERN_SELECTION: usize = 3;

impl Funscript {
    /// Get the selected actions in timestamp order
    pub fn selection(&self) -> &[Action] {
        &self.data.selection
    }

    /// Check if anything is selected
    pub fn has_selection(&self) -> bool {
        !self.data.selection.is_empty()
    }

    /// Get the number of selected actions
    pub fn selection_len(&self) -> usize {
        self.data.selection.len()
    }

    /// Check if an action is selected
    pub fn is_selected(&self, action: Action) -> bool {
        self.data.selection.binary_search(&action).is_ok()
    }

    /// Toggle an action in the selection, returning whether it is now selected
    pub fn toggle_selection(&mut self, action: Action) -> Result<bool> {
        let selected = !self.is_selected(action);
        self.set_selected(action, selected)?;
        Ok(selected)
    }

    /// Select or deselect an action.
    ///
    /// Selecting an action that is not in the script fails with `NotFound`.
    pub fn set_selected(&mut self, action: Action, selected: bool) -> Result<()> {
        match (self.data.selection.binary_search(&action), selected) {
            (Ok(index), false) => {
                self.data.selection.remove(index);
                self.mark_selection_changed();
            }
            (Err(index), true) => {
                if self.index_of(&action).is_none() {
                    return Err(Error::NotFound { action });
                }
                self.data.selection.insert(index, action);
                self.mark_selection_changed();
            }
            _ => {}
        }
        Ok(())
    }

    /// Select an existing action
    pub fn select_action(&mut self, action: Action) -> Result<()> {
        self.set_selected(action, true)
    }

    /// Deselect an action
    pub fn deselect_action(&mut self, action: Action) -> Result<()> {
        self.set_selected(action, false)
    }

    /// Select every action
    pub fn select_all(&mut self) {
        self.data.selection = self.data.actions.clone();
        self.mark_selection_changed();
    }

    /// Clear the selection
    pub fn clear_selection(&mut self) {
        self.data.selection.clear();
        self.mark_selection_changed();
    }

    /// Replace the selection, keeping only actions present in the script
    pub fn set_selection(&mut self, actions: &[Action]) {
        let mut selection: Vec<Action> = actions
            .iter()
            .copied()
            .filter(|a| self.index_of(a).is_some())
            .collect();
        selection.sort_unstable();
        selection.dedup();
        self.data.selection = selection;
        self.mark_selection_changed();
    }

    /// Select every action with a timestamp in `[from_ms, to_ms]`.
    ///
    /// With `clear` the previous selection is replaced, otherwise the range
    /// is merged into it.
    pub fn select_time(&mut self, from_ms: i32, to_ms: i32, clear: bool) -> Result<()> {
        if from_ms > to_ms {
            return Err(Error::InvalidInterval {
                from: from_ms,
                to: to_ms,
            });
        }
        let in_range = self.actions_in_range(from_ms, to_ms).to_vec();
        if clear {
            self.data.selection = in_range;
        } else {
            self.data.selection.extend(in_range);
            self.data.selection.sort_unstable();
            self.data.selection.dedup();
        }
        self.mark_selection_changed();
        Ok(())
    }

    /// Keep only the peaks of the selection
    pub fn select_top_points(&mut self) -> Result<()> {
        self.require_pattern_selection()?;
        self.data.selection = top_points(&self.data.selection);
        self.mark_selection_changed();
        Ok(())
    }

    /// Keep only the troughs of the selection
    pub fn select_bottom_points(&mut self) -> Result<()> {
        self.require_pattern_selection()?;
        self.data.selection = bottom_points(&self.data.selection);
        self.mark_selection_changed();
        Ok(())
    }

    /// Keep only the points that are neither peaks nor troughs
    pub fn select_mid_points(&mut self) -> Result<()> {
        self.require_pattern_selection()?;
        let top = top_points(&self.data.selection);
        let bottom = bottom_points(&self.data.selection);
        self.data
            .selection
            .retain(|a| !top.contains(a) && !bottom.contains(a));
        self.mark_selection_changed();
        Ok(())
    }

    /// Space the selected actions evenly between the first and last one.
    ///
    /// Interior timestamps are rounded to the nearest millisecond. Fails
    /// without changes if a new timestamp would land on an unselected action.
    pub fn equalize_selection(&mut self) -> Result<()> {
        self.require_pattern_selection()?;
        let selection = self.data.selection.clone();
        let count = selection.len();
        let first = selection[0];
        let last = selection[count - 1];
        let step_ms = f64::from(last.at - first.at) / (count - 1) as f64;

        let mut equalized = selection.clone();
        for (i, action) in equalized.iter_mut().enumerate().take(count - 1).skip(1) {
            action.at = first.at + (i as f64 * step_ms).round() as i32;
        }

        self.replace_actions(&selection, &equalized)?;
        self.data.selection = equalized;
        self.mark_selection_changed();
        Ok(())
    }

    /// Mirror every selected position around the middle (`100 - pos`)
    pub fn invert_selection(&mut self) -> Result<()> {
        if self.data.selection.is_empty() {
            return Ok(());
        }
        let selection = self.data.selection.clone();
        let inverted: Vec<Action> = selection
            .iter()
            .map(|a| a.with_pos(MAX_POSITION - a.pos))
            .collect();

        self.replace_actions(&selection, &inverted)?;
        self.data.selection = inverted;
        self.mark_selection_changed();
        Ok(())
    }

    /// Stretch each stroke of the selection by `amount` at both ends.
    ///
    /// The selection is walked as a polyline and split into monotonic
    /// strokes; interior points of each stroke are rescaled from the
    /// stroke's observed range to the extended one, clamped to 0..=100.
    pub fn range_extend_selection(&mut self, amount: i32) -> Result<()> {
        self.require_pattern_selection()?;
        if amount == 0 {
            return Ok(());
        }
        let selection = self.data.selection.clone();
        let mut positions: Vec<i32> = selection.iter().map(|a| a.pos).collect();
        extend_range(&mut positions, amount);

        let extended: Vec<Action> = selection
            .iter()
            .zip(&positions)
            .map(|(a, &pos)| a.with_pos(pos))
            .collect();
        if extended == selection {
            return Ok(());
        }

        self.replace_actions(&selection, &extended)?;
        self.data.selection = extended;
        self.mark_selection_changed();
        Ok(())
    }

    /// Remove every selected action from the script
    pub fn remove_selected_actions(&mut self) -> usize {
        let selection = std::mem::take(&mut self.data.selection);
        let removed = self.remove_actions(&selection);
        self.mark_selection_changed();
        removed
    }

    fn require_pattern_selection(&self) -> Result<()> {
        let len = self.data.selection.len();
        if len < MIN_PATTERN_SELECTION {
            return Err(Error::SelectionTooSmall {
                len,
                required: MIN_PATTERN_SELECTION,
            });
        }
        Ok(())
    }
}

/// Selection minus, for each interior triple, the lower of its two local minima
fn top_points(selection: &[Action]) -> Vec<Action> {
    let deselect = local_extremes(selection, |a, b| a.pos < b.pos);
    selection
        .iter()
        .copied()
        .filter(|a| !deselect.contains(a))
        .collect()
}

/// Selection minus, for each interior triple, the higher of its two local maxima
fn bottom_points(selection: &[Action]) -> Vec<Action> {
    let deselect = local_extremes(selection, |a, b| a.pos > b.pos);
    selection
        .iter()
        .copied()
        .filter(|a| !deselect.contains(a))
        .collect()
}

/// For each interior triple, the winner of `prev` vs `current` and, if
/// different, the winner of that against `next`
fn local_extremes(selection: &[Action], beats: impl Fn(&Action, &Action) -> bool) -> Vec<Action> {
    let mut extremes = Vec::new();
    for window in selection.windows(3) {
        let (prev, current, next) = (window[0], window[1], window[2]);
        let first = if beats(&prev, &current) { prev } else { current };
        let second = if beats(&first, &next) { first } else { next };
        extremes.push(first);
        if first.at != second.at {
            extremes.push(second);
        }
    }
    extremes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StrokeDirection {
    None,
    Up,
    Down,
}

/// Rescale a position from `[lowest, highest]` to the extended range
fn stretch_position(position: i32, lowest: i32, highest: i32, extension: i32) -> i32 {
    if highest == lowest {
        return position;
    }
    let new_high = clamp_position(highest + extension);
    let new_low = clamp_position(lowest - extension);

    let relative = f64::from(position - lowest) / f64::from(highest - lowest);
    let stretched = relative * f64::from(new_high - new_low) + f64::from(new_low);
    clamp_position(stretched as i32)
}

/// Stretch the interior points of every monotonic stroke in place.
///
/// A stroke ends at a direction reversal or at the last element. The
/// extreme that closes one stroke opens the next, so its (possibly already
/// stretched) value seeds the next stroke's range.
fn extend_range(positions: &mut [i32], extension: i32) {
    let Some(&first) = positions.first() else {
        return;
    };
    let last_index = positions.len() - 1;

    let mut last_extreme_index = 0;
    let mut last_value = first;
    let mut last_extreme_value = first;
    let mut lowest = first;
    let mut highest = first;
    let mut direction = StrokeDirection::None;

    for index in 0..positions.len() {
        let value = positions[index];
        if direction == StrokeDirection::None {
            if value < last_extreme_value {
                direction = StrokeDirection::Down;
            } else if value > last_extreme_value {
                direction = StrokeDirection::Up;
            }
        } else if (value < last_value && direction == StrokeDirection::Up)
            || (value > last_value && direction == StrokeDirection::Down)
            || index == last_index
        {
            for position in &mut positions[last_extreme_index + 1..index] {
                *position = stretch_position(*position, lowest, highest, extension);
            }

            last_extreme_value = positions[index - 1];
            last_extreme_index = index - 1;
            highest = last_extreme_value;
            lowest = last_extreme_value;

            direction = if direction == StrokeDirection::Up {
                StrokeDirection::Down
            } else {
                StrokeDirection::Up
            };
        }

        last_value = positions[index];
        highest = highest.max(last_value);
        lowest = lowest.min(last_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(points: &[(i32, i32)]) -> Funscript {
        Funscript::with_actions(points.iter().map(|&(at, pos)| Action::new(at, pos)))
    }

    fn times(actions: &[Action]) -> Vec<i32> {
        actions.iter().map(|a| a.at).collect()
    }

    #[test]
    fn test_toggle_and_set() {
        let mut s = script(&[(0, 0), (100, 50), (200, 100)]);
        assert_eq!(s.toggle_selection(Action::new(200, 100)), Ok(true));
        assert_eq!(s.toggle_selection(Action::new(0, 0)), Ok(true));
        assert_eq!(times(s.selection()), vec![0, 200]);

        assert_eq!(s.toggle_selection(Action::new(0, 0)), Ok(false));
        assert_eq!(times(s.selection()), vec![200]);

        let missing = Action::new(50, 50);
        assert_eq!(
            s.set_selected(missing, true),
            Err(Error::NotFound { action: missing })
        );
    }

    #[test]
    fn test_select_time() {
        let mut s = script(&[(0, 0), (100, 50), (200, 100), (300, 0)]);
        s.select_time(100, 200, true).unwrap();
        assert_eq!(times(s.selection()), vec![100, 200]);

        s.select_time(0, 0, false).unwrap();
        assert_eq!(times(s.selection()), vec![0, 100, 200]);

        s.select_time(300, 300, true).unwrap();
        assert_eq!(times(s.selection()), vec![300]);

        assert!(s.select_time(10, 0, true).unwrap_err().is_invalid_range());
    }

    #[test]
    fn test_top_and_bottom_points() {
        let points = [(0, 0), (100, 100), (200, 0), (300, 100), (400, 0)];
        let mut s = script(&points);
        s.select_all();
        s.select_top_points().unwrap();
        assert_eq!(times(s.selection()), vec![100, 300]);

        let mut s = script(&points);
        s.select_all();
        s.select_bottom_points().unwrap();
        assert_eq!(times(s.selection()), vec![0, 200, 400]);
    }

    #[test]
    fn test_mid_points() {
        let mut s = script(&[(0, 0), (100, 50), (200, 100), (300, 50), (400, 0)]);
        s.select_all();
        s.select_mid_points().unwrap();
        assert_eq!(times(s.selection()), vec![100]);
    }

    #[test]
    fn test_pattern_requires_three() {
        let mut s = script(&[(0, 0), (100, 100)]);
        s.select_all();
        assert_eq!(
            s.select_top_points(),
            Err(Error::SelectionTooSmall { len: 2, required: 3 })
        );
        assert_eq!(s.selection_len(), 2);
    }

    #[test]
    fn test_equalize() {
        let mut s = script(&[(0, 10), (100, 20), (300, 30), (1000, 40)]);
        s.select_all();
        s.equalize_selection().unwrap();
        assert_eq!(times(s.actions()), vec![0, 333, 667, 1000]);
        assert_eq!(times(s.selection()), vec![0, 333, 667, 1000]);
        assert!(s.data().selection_is_sound());
    }

    #[test]
    fn test_equalize_collision_is_rejected() {
        let mut s = script(&[(0, 0), (10, 10), (20, 20), (30, 30), (60, 60)]);
        s.set_selection(&[Action::new(0, 0), Action::new(10, 10), Action::new(60, 60)]);
        let before = s.data().clone();
        assert_eq!(s.equalize_selection(), Err(Error::DuplicateTimestamp { at: 30 }));
        assert_eq!(s.data(), &before);
    }

    #[test]
    fn test_invert() {
        let mut s = script(&[(0, 30), (100, 0), (200, 100)]);
        s.select_time(0, 100, true).unwrap();
        s.invert_selection().unwrap();
        assert_eq!(
            s.actions(),
            &[Action::new(0, 70), Action::new(100, 100), Action::new(200, 100)]
        );
        assert_eq!(s.selection(), &[Action::new(0, 70), Action::new(100, 100)]);
    }

    #[test]
    fn test_range_extend_zero_is_noop() {
        let mut s = script(&[(0, 20), (100, 40), (200, 60), (300, 30), (400, 10)]);
        s.select_all();
        let before = s.data().clone();
        s.range_extend_selection(0).unwrap();
        assert_eq!(s.data(), &before);
    }

    #[test]
    fn test_range_extend_stretches_interior() {
        let mut positions = vec![20, 40, 60, 30, 10];
        extend_range(&mut positions, 10);
        // Up stroke 20..60 becomes 10..70: 40 sits at the middle.
        assert_eq!(positions[1], 40);
        // The first and last points are never stretched.
        assert_eq!(positions[0], 20);
        assert_eq!(positions[4], 10);
        // The turning point is stretched to 70 and seeds the down stroke,
        // whose observed low of 30 maps onto the new low of 20.
        assert_eq!(positions[2], 70);
        assert_eq!(positions[3], 20);
    }

    #[test]
    fn test_range_extend_keeps_selection() {
        let mut s = script(&[(0, 20), (100, 40), (200, 60), (300, 30), (400, 10)]);
        s.select_all();
        s.range_extend_selection(10).unwrap();
        assert_eq!(s.selection(), s.actions());
        assert!(s.data().selection_is_sound());
    }

    #[test]
    fn test_stretch_position_flat_range() {
        assert_eq!(stretch_position(50, 50, 50, 10), 50);
    }

    #[test]
    fn test_remove_selected() {
        let mut s = script(&[(0, 0), (100, 50), (200, 100)]);
        s.select_time(0, 100, true).unwrap();
        assert_eq!(s.remove_selected_actions(), 2);
        assert_eq!(times(s.actions()), vec![200]);
        assert!(!s.has_selection());
    }
}
