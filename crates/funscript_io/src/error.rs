// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persistence errors.

use thiserror::Error;

/// Errors raised while reading or writing funscript documents
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Well-formed JSON that is not a funscript
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The save thread is no longer running
    #[error("Save worker stopped")]
    WorkerStopped,
}

/// Result type for persistence operations
pub type Result<T> = std::result::Result<T, Error>;
