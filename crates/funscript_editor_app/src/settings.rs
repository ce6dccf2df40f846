// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor settings.
//!
//! Settings are stored as RON. A missing file means defaults; a file from a
//! newer editor is rejected rather than silently misread.

use crate::error::SettingsError;
use funscript_core::MAX_SCRIPT_STATES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name, looked up in the working directory
pub const SETTINGS_FILE_NAME: &str = "funscript_editor.ron";

/// Environment variable overriding the settings path
pub const SETTINGS_ENV_VAR: &str = "FUNSCRIPT_EDITOR_SETTINGS";

/// Editor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Format version
    pub version: u32,
    /// Undo snapshots kept per document
    pub undo_history_depth: usize,
    /// Tolerance for add-or-replace and paste, one video frame
    pub frame_time_ms: u32,
    /// Gap kept to unselected actions when moving a selection in time
    pub min_spacing_ms: i32,
    /// Tolerance for nearest-action lookups
    pub snap_tolerance_ms: u32,
    /// Write indented JSON
    pub pretty_json: bool,
    /// Use the lookup index for time queries
    pub use_spline_index: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            undo_history_depth: MAX_SCRIPT_STATES,
            frame_time_ms: 16,
            min_spacing_ms: 16,
            snap_tolerance_ms: 50,
            pretty_json: false,
            use_spline_index: true,
        }
    }
}

impl EditorSettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: EditorSettings = ron::from_str(&content)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Where settings are read from: the override variable, or the working directory
    pub fn locate() -> PathBuf {
        std::env::var_os(SETTINGS_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE_NAME))
    }

    /// Load from `path`, falling back to defaults if it is missing or unreadable
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("No settings at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => {
                tracing::info!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                tracing::warn!("Failed to load settings from {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = EditorSettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.undo_history_depth, 1000);
        assert_eq!(settings.frame_time_ms, 16);
        assert!(settings.use_spline_index);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        let settings = EditorSettings {
            snap_tolerance_ms: 80,
            pretty_json: true,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(EditorSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: EditorSettings = ron::from_str("(min_spacing_ms: 4)").unwrap();
        assert_eq!(settings.min_spacing_ms, 4);
        assert_eq!(settings.frame_time_ms, 16);
    }

    #[test]
    fn test_newer_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "(version: 99)").unwrap();
        assert!(matches!(
            EditorSettings::load(&path),
            Err(SettingsError::UnsupportedVersion { found: 99, .. })
        ));
        assert_eq!(EditorSettings::load_or_default(&path), EditorSettings::default());
    }
}
