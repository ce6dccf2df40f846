// SPDX-License-Identifier: MIT OR Apache-2.0
//! Funscript Editor - headless entry point
//!
//! Opens a funscript, reports on it and writes it back through the
//! background save path:
//!
//! ```text
//! funscript_editor <input.funscript> [output.funscript]
//! ```
//!
//! Logging goes through `tracing`; set `RUST_LOG` to override the default
//! filter.

use funscript_core::FunscriptEvent;
use funscript_editor_app::{EditorSettings, ScriptId, Session, SessionError};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is not set
const DEFAULT_LOG_FILTER: &str = "funscript_editor_app=debug,funscript_core=info,funscript_io=info";

fn main() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Funscript Editor v{}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let Some(input) = args.next() else {
        eprintln!("usage: funscript_editor <input.funscript> [output.funscript]");
        std::process::exit(2);
    };
    let output = args.next();

    if let Err(e) = run(input, output) {
        tracing::error!("Editor failed: {e}");
        std::process::exit(1);
    }
}

fn run(input: PathBuf, output: Option<PathBuf>) -> Result<(), SessionError> {
    let settings = EditorSettings::load_or_default(&EditorSettings::locate());
    let mut session = Session::new(settings);
    session.add_observer(|id: ScriptId, event: FunscriptEvent| {
        tracing::debug!("{}: {}", id, event.name());
    });

    let id = session.open(&input)?;
    session.tick();

    if let Some(document) = session.document(id) {
        let script = &document.script;
        tracing::info!(
            "'{}': {} actions, {:.1} s, {} strokes",
            document.name(),
            script.len(),
            f64::from(script.duration_ms()) / 1000.0,
            script.stroke_count()
        );
    }

    session.save(id, output)?;
    session.wait_for_saves();

    match session.save_failures() {
        0 => Ok(()),
        failures => Err(SessionError::SaveFailed { failures }),
    }
}
