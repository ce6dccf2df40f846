// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deferred change notification.
//!
//! Mutations only raise flags. The owner drains them once per tick through
//! [`Funscript::update`](crate::Funscript::update), so any number of edits
//! between two ticks produce at most one event of each kind.

/// Events emitted by a script when its pending flags are drained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunscriptEvent {
    /// The action list changed
    ActionsChanged,
    /// The selection changed
    SelectionChanged,
}

impl FunscriptEvent {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::ActionsChanged => "actions changed",
            Self::SelectionChanged => "selection changed",
        }
    }
}

/// Pending change flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeFlags {
    /// The action list was mutated since the last drain
    pub actions_changed: bool,
    /// The selection was mutated since the last drain
    pub selection_changed: bool,
}

impl ChangeFlags {
    /// Whether any flag is raised
    pub fn any(&self) -> bool {
        self.actions_changed || self.selection_changed
    }

    /// Take the raised flags as events, clearing them
    pub fn drain(&mut self) -> Vec<FunscriptEvent> {
        let mut events = Vec::with_capacity(2);
        if std::mem::take(&mut self.actions_changed) {
            events.push(FunscriptEvent::ActionsChanged);
        }
        if std::mem::take(&mut self.selection_changed) {
            events.push(FunscriptEvent::SelectionChanged);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_once() {
        let mut flags = ChangeFlags {
            actions_changed: true,
            selection_changed: true,
        };
        assert!(flags.any());
        assert_eq!(
            flags.drain(),
            vec![FunscriptEvent::ActionsChanged, FunscriptEvent::SelectionChanged]
        );
        assert!(!flags.any());
        assert!(flags.drain().is_empty());
    }
}
