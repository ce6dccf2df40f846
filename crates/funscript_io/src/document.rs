// SPDX-License-Identifier: MIT OR Apache-2.0
//! The on-disk funscript format.
//!
//! Documents are JSON objects with an `actions` array of `{at, pos}` pairs
//! plus a few canonical header fields. Loading is lenient: fractional values
//! are rounded, positions are rescaled from a non-default `range` and
//! un-inverted, and a malformed `metadata` block falls back to defaults.
//! Every top-level field the editor does not generate is preserved.

use crate::error::{Error, Result};
use funscript_core::{is_canonical_field, Action, Funscript, Metadata, MAX_POSITION};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Format version written to every saved document
pub const FUNSCRIPT_VERSION: &str = "1.0";

/// Position range written to every saved document
pub const FUNSCRIPT_RANGE: i32 = 100;

/// A funscript as stored on disk.
///
/// Field order is the order written: canonical fields first, then the
/// preserved foreign fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunscriptDocument {
    /// Format version
    pub version: String,
    /// Whether positions are stored mirrored
    pub inverted: bool,
    /// Position scale
    pub range: i32,
    /// Actions in time order
    pub actions: Vec<Action>,
    /// Descriptive metadata
    pub metadata: Metadata,
    /// Fields written by other tools
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    actions: Vec<RawAction>,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    inverted: bool,
    #[serde(default)]
    range: Option<f64>,
    #[serde(default)]
    metadata: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    at: f64,
    pos: f64,
}

impl FunscriptDocument {
    /// Parse a document from JSON text.
    ///
    /// The result is normalized: `inverted` is false and `range` is 100.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(Error::InvalidDocument(
                "top level is not a JSON object".to_string(),
            ));
        }
        let raw: RawDocument = serde_json::from_value(value)?;

        let scale = match raw.range {
            Some(range) if range > 0.0 && range != f64::from(FUNSCRIPT_RANGE) => {
                tracing::debug!("Rescaling positions from range {range}");
                f64::from(FUNSCRIPT_RANGE) / range
            }
            _ => 1.0,
        };

        let mut actions = Vec::with_capacity(raw.actions.len());
        let mut skipped = 0usize;
        for RawAction { at, pos } in raw.actions {
            let at = at.round();
            if !(0.0..=f64::from(i32::MAX)).contains(&at) {
                skipped += 1;
                continue;
            }
            let action = Action::new(at as i32, (pos * scale).round() as i32);
            if raw.inverted {
                actions.push(action.with_pos(MAX_POSITION - action.pos));
            } else {
                actions.push(action);
            }
        }
        if skipped > 0 {
            tracing::warn!("Skipped {skipped} actions with out-of-range timestamps");
        }

        let metadata = match raw.metadata {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed metadata: {}", e);
                Metadata::default()
            }),
            None => Metadata::default(),
        };

        let version = match raw.version {
            Some(Value::String(version)) => version,
            Some(Value::Number(number)) => number.to_string(),
            _ => FUNSCRIPT_VERSION.to_string(),
        };

        let mut extra = raw.extra;
        extra.retain(|key, _| !is_canonical_field(key));

        Ok(Self {
            version,
            inverted: false,
            range: FUNSCRIPT_RANGE,
            actions,
            metadata,
            extra,
        })
    }

    /// Snapshot a script for writing
    pub fn from_script(script: &Funscript) -> Self {
        Self {
            version: FUNSCRIPT_VERSION.to_string(),
            inverted: false,
            range: FUNSCRIPT_RANGE,
            actions: script.actions().to_vec(),
            metadata: script.metadata.clone(),
            extra: script.base_fields().clone(),
        }
    }

    /// Build an editable script from this document
    pub fn into_funscript(self) -> Funscript {
        let mut script = Funscript::with_actions(self.actions);
        script.metadata = self.metadata;
        script.set_base_fields(self.extra);
        script
    }

    /// Serialize to JSON text
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Load a funscript file into an editable script
pub fn load_funscript(path: impl AsRef<Path>) -> Result<Funscript> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let document = FunscriptDocument::from_json_str(&content)?;
    tracing::info!("Loaded {} actions from {:?}", document.actions.len(), path);
    Ok(document.into_funscript())
}
