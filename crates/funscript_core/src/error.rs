// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error taxonomy for timeline operations.
//!
//! Every error is recoverable: when an operation returns one, the script is
//! left exactly as it was before the call.

use crate::action::Action;
use thiserror::Error;

/// Which history stack an operation tried to pop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    /// The undo stack
    Undo,
    /// The redo stack
    Redo,
}

impl std::fmt::Display for HistoryDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undo => f.write_str("undo"),
            Self::Redo => f.write_str("redo"),
        }
    }
}

/// Timeline errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An action already occupies the timestamp
    #[error("An action already exists at {at} ms")]
    DuplicateTimestamp {
        /// The contested timestamp
        at: i32,
    },

    /// Actions cannot sit before the start of the timeline
    #[error("Negative timestamp: {at} ms")]
    NegativeTimestamp {
        /// The rejected timestamp
        at: i32,
    },

    /// The target action is not in the script
    #[error("Action not found: {action:?}")]
    NotFound {
        /// The action that was looked up
        action: Action,
    },

    /// Nothing left to undo or redo
    #[error("Nothing to {0}")]
    EmptyHistory(HistoryDirection),

    /// A time interval with its bounds reversed
    #[error("Invalid interval: {from} ms to {to} ms")]
    InvalidInterval {
        /// Interval start
        from: i32,
        /// Interval end
        to: i32,
    },

    /// A pattern operation needs more selected actions
    #[error("Selection too small: {len} selected, {required} required")]
    SelectionTooSmall {
        /// Current selection size
        len: usize,
        /// Minimum size the operation needs
        required: usize,
    },
}

impl Error {
    /// Whether this error belongs to the invalid-range class
    pub fn is_invalid_range(&self) -> bool {
        matches!(self, Self::InvalidInterval { .. } | Self::SelectionTooSmall { .. })
    }
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, Error>;
