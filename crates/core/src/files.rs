// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! File and version payloads exchanged with the backend.
//!
//! The path is the natural key for every payload here. Ordering between
//! concurrent changes to the same path is decided by the backend.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A file creation or update, and the shape of each entry in a full sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path of the file, relative to the synced root.
    pub path: String,
    /// File content.
    #[serde(default)]
    pub content: String,
    /// Application-defined file type (e.g. "text", "script").
    #[serde(default)]
    pub file_type: String,
    /// Program associated with the file, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    /// Free-form metadata attached to the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl FileChange {
    /// Creates a change with no program or metadata.
    pub fn new(
        path: impl Into<String>,
        content: impl Into<String>,
        file_type: impl Into<String>,
    ) -> Self {
        FileChange {
            path: path.into(),
            content: content.into(),
            file_type: file_type.into(),
            program: None,
            metadata: None,
        }
    }

    /// Sets the associated program.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Sets the metadata map.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// One stored revision of a file. Never mutated by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: u64,
    /// Backend timestamp, kept verbatim (string or epoch number).
    #[serde(default, deserialize_with = "string_or_number")]
    pub timestamp: String,
    /// Content snapshot at this version.
    #[serde(default)]
    pub content: String,
}

/// Version history of a single path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionHistory {
    #[serde(default)]
    pub path: String,
    /// The version currently live on the backend.
    #[serde(default)]
    pub current: u64,
    #[serde(default)]
    pub versions: Vec<VersionRecord>,
}

impl VersionHistory {
    /// Looks up a specific version.
    pub fn get(&self, version: u64) -> Option<&VersionRecord> {
        self.versions.iter().find(|v| v.version == version)
    }
}

/// Accepts a JSON string or number and yields its string form.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;
