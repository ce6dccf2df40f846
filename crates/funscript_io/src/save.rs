// SPDX-License-Identifier: MIT OR Apache-2.0
//! Background saving.
//!
//! A save is handed off as a [`SaveRequest`] holding its own copy of the
//! actions, so the editor keeps working while the file is written. One
//! worker thread drains the queue, so saves finish in submission order.

use crate::document::{FunscriptDocument, FUNSCRIPT_RANGE, FUNSCRIPT_VERSION};
use crate::error::{Error, Result};
use funscript_core::{clamp_position, is_canonical_field, Action, Funscript, Metadata};
use parking_lot::{Condvar, Mutex};
use serde_json::{Map, Value};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Everything needed to write a script, detached from the live editor state
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    /// Target file
    pub destination: PathBuf,
    /// Copy of the actions at hand-off time
    pub actions: Vec<Action>,
    /// Metadata to write
    pub metadata: Metadata,
    /// Foreign fields merged beneath the canonical ones
    pub base: Map<String, Value>,
}

impl SaveRequest {
    /// Capture a script for saving
    pub fn from_script(script: &Funscript, destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            actions: script.actions().to_vec(),
            metadata: script.metadata.clone(),
            base: script.base_fields().clone(),
        }
    }

    /// Build the document to write.
    ///
    /// Actions before 0 ms are dropped and positions are clamped. Canonical
    /// fields always win over foreign ones.
    pub fn into_document(self) -> FunscriptDocument {
        let before = self.actions.len();
        let actions: Vec<Action> = self
            .actions
            .into_iter()
            .filter(|a| a.at >= 0)
            .map(|a| Action {
                at: a.at,
                pos: clamp_position(a.pos),
            })
            .collect();
        if actions.len() != before {
            tracing::warn!("Dropped {} actions with negative timestamps", before - actions.len());
        }

        let mut extra = self.base;
        extra.retain(|key, _| !is_canonical_field(key));

        FunscriptDocument {
            version: FUNSCRIPT_VERSION.to_string(),
            inverted: false,
            range: FUNSCRIPT_RANGE,
            actions,
            metadata: self.metadata,
            extra,
        }
    }
}

/// Write a request on the calling thread.
///
/// The file is written next to the destination first and then renamed over
/// it, so readers never see a partial document.
pub fn save_blocking(request: SaveRequest, pretty: bool) -> Result<()> {
    let destination = request.destination.clone();
    let json = request.into_document().to_json(pretty)?;

    let tmp = temp_path(&destination);
    std::fs::write(&tmp, json)?;
    if let Err(e) = std::fs::rename(&tmp, &destination) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[derive(Debug, Default)]
struct SaveState {
    /// Saves handed off but not yet finished
    in_flight: Mutex<usize>,
    idle: Condvar,
    completed: AtomicUsize,
    failures: AtomicUsize,
}

impl SaveState {
    fn finish(&self) {
        let mut in_flight = self.in_flight.lock();
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.idle.notify_all();
        }
    }
}

/// Hands saves off to a background thread.
///
/// Requests are written one at a time in the order they were submitted, so
/// the last save to a destination is the one left on disk.
#[derive(Debug, Clone)]
pub struct SaveWorker {
    request_tx: mpsc::UnboundedSender<SaveRequest>,
    state: Arc<SaveState>,
}

impl SaveWorker {
    /// Create a worker, optionally writing indented JSON
    pub fn new(pretty: bool) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let state = Arc::new(SaveState::default());

        let worker_state = Arc::clone(&state);
        std::thread::spawn(move || {
            save_worker(request_rx, &worker_state, pretty);
        });

        Self { request_tx, state }
    }

    /// Queue a request behind any pending saves.
    ///
    /// Write failures are logged and counted; only a stopped worker is
    /// returned as an error.
    pub fn submit(&self, request: SaveRequest) -> Result<()> {
        *self.state.in_flight.lock() += 1;
        if self.request_tx.send(request).is_err() {
            self.state.finish();
            return Err(Error::WorkerStopped);
        }
        Ok(())
    }

    /// Block until every submitted save has finished
    pub fn wait_idle(&self) {
        let mut in_flight = self.state.in_flight.lock();
        while *in_flight > 0 {
            self.state.idle.wait(&mut in_flight);
        }
    }

    /// Saves submitted but not yet finished
    pub fn in_flight(&self) -> usize {
        *self.state.in_flight.lock()
    }

    /// Saves written successfully
    pub fn completed(&self) -> usize {
        self.state.completed.load(Ordering::Relaxed)
    }

    /// Saves that failed to write
    pub fn failures(&self) -> usize {
        self.state.failures.load(Ordering::Relaxed)
    }
}

/// Drain requests until every sender is gone
fn save_worker(
    mut request_rx: mpsc::UnboundedReceiver<SaveRequest>,
    state: &SaveState,
    pretty: bool,
) {
    while let Some(request) = request_rx.blocking_recv() {
        let destination = request.destination.clone();
        match save_blocking(request, pretty) {
            Ok(()) => {
                state.completed.fetch_add(1, Ordering::Relaxed);
                tracing::info!("Saved funscript to {:?}", destination);
            }
            Err(e) => {
                state.failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Failed to save {:?}: {}", destination, e);
            }
        }
        state.finish();
    }
}

impl Default for SaveWorker {
    fn default() -> Self {
        Self::new(false)
    }
}
