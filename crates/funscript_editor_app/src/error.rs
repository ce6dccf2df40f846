// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application errors.

use crate::session::ScriptId;
use thiserror::Error;

/// Errors raised by session operations
#[derive(Debug, Error)]
pub enum SessionError {
    /// A timeline edit was rejected
    #[error(transparent)]
    Edit(#[from] funscript_core::Error),

    /// Loading or saving failed
    #[error(transparent)]
    Persistence(#[from] funscript_io::Error),

    /// No open document has this id
    #[error("Unknown document: {0}")]
    UnknownDocument(ScriptId),

    /// The document was never given a file path
    #[error("Document {0} has no save path")]
    NoSavePath(ScriptId),

    /// Background saves failed to write
    #[error("{failures} save(s) failed")]
    SaveFailed {
        /// Number of failed saves
        failures: usize,
    },
}

/// Errors raised while reading or writing settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed settings file
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer editor
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}
