// SPDX-License-Identifier: MIT OR Apache-2.0
//! Snapshot-based undo/redo.
//!
//! Every logical edit pushes a full copy of the script state tagged with the
//! kind of edit that is about to happen. Undo and redo swap the live state
//! with the top of the respective stack. History is bounded and evicts the
//! oldest snapshot first.

use crate::action::FunscriptData;
use crate::error::{Error, HistoryDirection, Result};
use crate::funscript::Funscript;
use std::collections::VecDeque;

/// Maximum number of snapshots kept in the undo stack
pub const MAX_SCRIPT_STATES: usize = 1000;

/// Kind of logical edit a snapshot was taken for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    /// Several actions added or edited at once
    AddEditActions,
    /// One action added or edited
    AddEditAction,
    /// One action added
    AddAction,
    /// Several actions removed
    RemoveActions,
    /// One action removed
    RemoveAction,
    /// An action dragged with the mouse
    MouseMoveAction,
    /// Selected actions moved in time or position
    ActionsMoved,
    /// Selection cut to the clipboard
    CutSelection,
    /// Selection deleted
    RemoveSelection,
    /// Clipboard pasted
    PasteCopiedActions,
    /// Selection spaced evenly
    EqualizeActions,
    /// Selection positions mirrored
    InvertActions,
    /// Neighbours of an action removed
    IsolateAction,
    /// Selection reduced to top points
    TopPointsOnly,
    /// Selection reduced to mid points
    MidPointsOnly,
    /// Selection reduced to bottom points
    BottomPointsOnly,
    /// Actions generated from a pattern
    GenerateActions,
    /// Actions snapped to video frames
    FrameAlign,
    /// Selection range stretched
    RangeExtend,
    /// Edit made by a user script
    CustomScript,
}

impl EditKind {
    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::AddEditActions => "Add/Edit actions",
            Self::AddEditAction => "Add/Edit action",
            Self::AddAction => "Add action",
            Self::RemoveActions => "Remove actions",
            Self::RemoveAction => "Remove action",
            Self::MouseMoveAction => "Mouse moved actions",
            Self::ActionsMoved => "Actions moved",
            Self::CutSelection => "Cut selection",
            Self::RemoveSelection => "Remove selection",
            Self::PasteCopiedActions => "Paste selection",
            Self::EqualizeActions => "Equalize actions",
            Self::InvertActions => "Invert actions",
            Self::IsolateAction => "Isolate action",
            Self::TopPointsOnly => "Top points only",
            Self::MidPointsOnly => "Mid points only",
            Self::BottomPointsOnly => "Bottom points only",
            Self::GenerateActions => "Generate actions",
            Self::FrameAlign => "Frame align",
            Self::RangeExtend => "Range extend",
            Self::CustomScript => "Custom script",
        }
    }
}

/// A full copy of a script state
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptState {
    /// The edit this state was captured for
    pub kind: EditKind,
    /// Actions and selection at capture time
    pub data: FunscriptData,
}

/// History statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryStats {
    /// Snapshots in the undo stack
    pub undo_count: usize,
    /// Snapshots in the redo stack
    pub redo_count: usize,
    /// Maximum undo depth
    pub max_depth: usize,
    /// Actions held across both stacks
    pub actions_held: usize,
}

/// Undo/redo log for a single script
#[derive(Debug)]
pub struct UndoSystem {
    undo_stack: VecDeque<ScriptState>,
    redo_stack: Vec<ScriptState>,
    max_depth: usize,
}

impl UndoSystem {
    /// Create a log holding up to [`MAX_SCRIPT_STATES`] snapshots
    pub fn new() -> Self {
        Self::with_max_depth(MAX_SCRIPT_STATES)
    }

    /// Create with a custom bound. A bound of 0 is raised to 1.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Capture the script before an edit of the given kind, clearing redo
    pub fn snapshot(&mut self, kind: EditKind, script: &Funscript) {
        self.snapshot_with(kind, script, true);
    }

    /// Capture the script, optionally keeping the redo history
    pub fn snapshot_with(&mut self, kind: EditKind, script: &Funscript, clear_redo: bool) {
        if clear_redo {
            self.redo_stack.clear();
        }
        self.push_undo(ScriptState {
            kind,
            data: script.data().clone(),
        });
        tracing::debug!(
            "Snapshot '{}' ({} undo states)",
            kind.description(),
            self.undo_stack.len()
        );
    }

    /// Record a state captured before an edit that has already been applied.
    ///
    /// Behaves like [`snapshot`](Self::snapshot) for callers that only keep
    /// the state once the edit succeeded.
    pub fn record(&mut self, kind: EditKind, before: FunscriptData) {
        self.redo_stack.clear();
        self.push_undo(ScriptState { kind, data: before });
        tracing::debug!(
            "Recorded '{}' ({} undo states)",
            kind.description(),
            self.undo_stack.len()
        );
    }

    /// Restore the state before the last edit
    pub fn undo(&mut self, script: &mut Funscript) -> Result<EditKind> {
        let state = self
            .undo_stack
            .pop_back()
            .ok_or(Error::EmptyHistory(HistoryDirection::Undo))?;
        self.redo_stack.push(ScriptState {
            kind: state.kind,
            data: script.data().clone(),
        });
        script.restore(state.data);
        tracing::debug!("Undo '{}'", state.kind.description());
        Ok(state.kind)
    }

    /// Reapply the last undone edit
    pub fn redo(&mut self, script: &mut Funscript) -> Result<EditKind> {
        let state = self
            .redo_stack
            .pop()
            .ok_or(Error::EmptyHistory(HistoryDirection::Redo))?;
        self.push_undo(ScriptState {
            kind: state.kind,
            data: script.data().clone(),
        });
        script.restore(state.data);
        tracing::debug!("Redo '{}'", state.kind.description());
        Ok(state.kind)
    }

    /// Whether the most recent snapshot was taken for `kind`
    pub fn match_top(&self, kind: EditKind) -> bool {
        self.undo_stack.back().is_some_and(|state| state.kind == kind)
    }

    /// Undo only if the most recent snapshot was taken for `kind`.
    ///
    /// Returns whether an undo happened.
    pub fn undo_if_top(&mut self, kind: EditKind, script: &mut Funscript) -> Result<bool> {
        if !self.match_top(kind) {
            return Ok(false);
        }
        self.undo(script)?;
        Ok(true)
    }

    /// Drop both stacks
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Drop the redo stack only
    pub fn clear_redo(&mut self) {
        self.redo_stack.clear();
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&'static str> {
        self.undo_stack.back().map(|s| s.kind.description())
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&'static str> {
        self.redo_stack.last().map(|s| s.kind.description())
    }

    /// Get history statistics
    pub fn stats(&self) -> HistoryStats {
        let actions_held = self
            .undo_stack
            .iter()
            .chain(self.redo_stack.iter())
            .map(|s| s.data.actions.len())
            .sum();
        HistoryStats {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            max_depth: self.max_depth,
            actions_held,
        }
    }

    fn push_undo(&mut self, state: ScriptState) {
        self.undo_stack.push_back(state);
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }
}

impl Default for UndoSystem {
    fn default() -> Self {
        Self::new()
    }
}
