// SPDX-License-Identifier: MIT OR Apache-2.0
//! Funscript Editor application layer.
//!
//! Editing lives in `funscript_core`, loading and saving in `funscript_io`.
//! This crate ties them together:
//! - [`Session`]: open scripts, per-script undo, per-tick notification, save hand-off
//! - [`EditorSettings`]: RON settings file
//! - Application error types

pub mod error;
pub mod session;
pub mod settings;

pub use error::{SessionError, SettingsError};
pub use session::{ScriptDocument, ScriptId, Session, SessionObserver};
pub use settings::EditorSettings;
