// SPDX-License-Identifier: MIT OR Apache-2.0
//! Funscript persistence.
//!
//! Loading parses the JSON document format into an editable
//! [`Funscript`](funscript_core::Funscript), keeping any fields written by
//! other tools. Saving copies the script into a [`SaveRequest`] and writes
//! it on a background thread through [`SaveWorker`].

pub mod document;
pub mod error;
pub mod save;

pub use document::{load_funscript, FunscriptDocument, FUNSCRIPT_RANGE, FUNSCRIPT_VERSION};
pub use error::{Error, Result};
pub use save::{save_blocking, SaveRequest, SaveWorker};
