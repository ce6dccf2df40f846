// SPDX-License-Identifier: MIT OR Apache-2.0
//! Script metadata.

use serde::{Deserialize, Serialize};

/// Top-level document fields written by the editor itself.
///
/// Anything else found in a loaded document belongs to other tools and is
/// carried through untouched.
pub const CANONICAL_FIELDS: [&str; 6] = [
    "actions",
    "version",
    "inverted",
    "range",
    "OpenFunscripter",
    "metadata",
];

/// Descriptive metadata stored alongside the actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Script type tag
    #[serde(rename = "type")]
    pub kind: String,
    /// Script title
    pub title: String,
    /// Script author
    pub creator: String,
    /// Where the script is published
    pub script_url: String,
    /// Where the matching video is published
    pub video_url: String,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Performers in the video
    pub performers: Vec<String>,
    /// Description
    pub description: String,
    /// License
    pub license: String,
    /// Notes
    pub notes: String,
    /// Video duration in seconds
    pub duration: i64,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            kind: "basic".to_string(),
            title: String::new(),
            creator: String::new(),
            script_url: String::new(),
            video_url: String::new(),
            tags: Vec::new(),
            performers: Vec::new(),
            description: String::new(),
            license: String::new(),
            notes: String::new(),
            duration: 0,
        }
    }
}

impl Metadata {
    /// Create metadata with a title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Whether a top-level document key is one the editor generates
pub fn is_canonical_field(key: &str) -> bool {
    CANONICAL_FIELDS.contains(&key)
}
