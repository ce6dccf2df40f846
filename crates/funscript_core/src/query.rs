// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time-based queries over the action store.
//!
//! Every query goes through the lookup index when it is enabled and falls
//! back to a binary search over the sorted actions otherwise. Both paths
//! return identical results.

use crate::action::Action;
use crate::funscript::Funscript;

impl Funscript {
    /// Interpolated position at a time.
    ///
    /// Returns 0 for an empty script and the only position for a single
    /// action. Before the first action the first position is held, after the
    /// last action the last position is held; there is no extrapolation.
    pub fn position_at_time(&self, time_ms: i32) -> f32 {
        let actions = &self.data.actions;
        match actions.len() {
            0 => return 0.0,
            1 => return actions[0].pos as f32,
            _ => {}
        }

        let index = self.lower_bound(time_ms);
        let Some(next) = actions.get(index) else {
            return actions[actions.len() - 1].pos as f32;
        };
        if next.at == time_ms || index == 0 {
            return next.pos as f32;
        }

        let prev = actions[index - 1];
        let progress = (time_ms - prev.at) as f32 / (next.at - prev.at) as f32;
        prev.pos as f32 + progress * (next.pos - prev.pos) as f32
    }

    /// Find an action by exact value
    pub fn get_action(&self, action: Action) -> Option<Action> {
        self.index_of(&action).map(|index| self.data.actions[index])
    }

    /// Closest action within `max_error_ms` of a time.
    ///
    /// When two actions are equally close the earlier one wins.
    pub fn action_near(&self, time_ms: i32, max_error_ms: u32) -> Option<Action> {
        let max_error = i32::try_from(max_error_ms).unwrap_or(i32::MAX);
        let start = self.lower_bound(time_ms.saturating_sub(max_error));
        let end = time_ms.saturating_add(max_error);

        let mut best: Option<(u32, Action)> = None;
        for action in self.data.actions[start..].iter().take_while(|a| a.at <= end) {
            let error = action.at.abs_diff(time_ms);
            if error > max_error_ms {
                continue;
            }
            match best {
                Some((smallest, _)) if error >= smallest => {}
                _ => best = Some((error, *action)),
            }
        }
        best.map(|(_, action)| action)
    }

    /// First action strictly after a time
    pub fn next_action_after(&self, time_ms: i32) -> Option<Action> {
        self.data.actions.get(self.upper_bound(time_ms)).copied()
    }

    /// Last action strictly before a time
    pub fn previous_action_before(&self, time_ms: i32) -> Option<Action> {
        self.lower_bound(time_ms)
            .checked_sub(1)
            .map(|index| self.data.actions[index])
    }

    /// Actions with timestamps in `[from_ms, to_ms]`
    pub fn actions_in_range(&self, from_ms: i32, to_ms: i32) -> &[Action] {
        if from_ms > to_ms {
            return &[];
        }
        let start = self.lower_bound(from_ms);
        let end = self.upper_bound(to_ms);
        &self.data.actions[start..end]
    }

    /// The stroke before the one ending nearest to `time_ms`.
    ///
    /// Finds the action nearest the reference time, walks back over the
    /// monotonic run leading into it, and returns the run before that in
    /// ascending time order. Scripts with fewer than two actions, or a
    /// reference inside the first stroke, give an empty result.
    pub fn last_stroke(&self, time_ms: i32) -> Vec<Action> {
        let actions = &self.data.actions;
        let Some(nearest) = actions
            .iter()
            .enumerate()
            .min_by_key(|(_, a)| a.at.abs_diff(time_ms))
            .map(|(index, _)| index)
        else {
            return Vec::new();
        };
        if nearest <= 1 {
            return Vec::new();
        }

        // Walk back over the run that ends at the nearest action.
        let mut going_up = actions[nearest - 1].pos > actions[nearest].pos;
        let mut prev_pos = actions[nearest - 1].pos;
        let mut cursor = nearest;
        let mut search = nearest - 1;
        while search != 0 {
            if (actions[search - 1].pos > prev_pos) != going_up {
                break;
            }
            prev_pos = actions[search - 1].pos;
            cursor = search;
            search -= 1;
        }

        cursor -= 1;
        if cursor == 0 {
            return Vec::new();
        }

        // Collect the run before it, which moves the other way.
        going_up = !going_up;
        prev_pos = actions[cursor].pos;
        let mut stroke = vec![actions[cursor]];
        let mut index = cursor - 1;
        loop {
            let action = actions[index];
            if (action.pos > prev_pos) != going_up || action.pos == prev_pos {
                break;
            }
            stroke.push(action);
            prev_pos = action.pos;
            if index == 0 {
                break;
            }
            index -= 1;
        }

        stroke.reverse();
        stroke
    }

    /// Number of maximal monotonic runs in the script
    pub fn stroke_count(&self) -> usize {
        let mut count = 0;
        let mut rising: Option<bool> = None;
        for pair in self.data.actions.windows(2) {
            let delta = pair[1].pos - pair[0].pos;
            if delta == 0 {
                continue;
            }
            let up = delta > 0;
            if rising != Some(up) {
                count += 1;
                rising = Some(up);
            }
        }
        count
    }
}
