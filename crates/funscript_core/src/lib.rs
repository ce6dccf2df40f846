// SPDX-License-Identifier: MIT OR Apache-2.0
//! Action timeline engine for the funscript editor.
//!
//! This crate provides the in-memory core of a script:
//! - Sorted action store with unique timestamps
//! - Lazily rebuilt lookup index for time queries
//! - Value-based selection with pattern edits
//! - Snapshot undo/redo with bounded history
//! - Deferred, coalesced change notification
//!
//! ## Architecture
//!
//! [`Funscript`] owns the actions, selection and index. Its methods are
//! split across modules by concern: queries, selection and the edit facade.
//! [`UndoSystem`] lives beside it and holds independent copies of past
//! states. Mutations only raise flags; the owner calls
//! [`Funscript::update`] once per tick to receive the resulting events.

pub mod action;
pub mod edit;
pub mod error;
pub mod events;
pub mod funscript;
pub mod metadata;
pub mod query;
pub mod selection;
pub mod spline;
pub mod undo;

pub use action::{clamp_position, Action, FunscriptData, MAX_POSITION, MIN_POSITION};
pub use error::{Error, HistoryDirection, Result};
pub use events::{ChangeFlags, FunscriptEvent};
pub use funscript::Funscript;
pub use metadata::{is_canonical_field, Metadata, CANONICAL_FIELDS};
pub use selection::MIN_PATTERN_SELECTION;
pub use spline::SplineIndex;
pub use undo::{EditKind, HistoryStats, ScriptState, UndoSystem, MAX_SCRIPT_STATES};
