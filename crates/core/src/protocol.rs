// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime protocol messages for client-server communication.
//!
//! Every frame is a JSON object `{"type": "...", ...payload}`:
//! - Client authenticates, keeps the channel alive, and pushes mutations
//! - Server acknowledges, pushes remote changes, and answers sync/history requests
//!
//! Inbound frames are decoded once into [`ServerMessage`]. Types this client
//! does not model are kept as [`ServerMessage::Unknown`] rather than rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::files::{string_or_number, FileChange, VersionHistory};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First message on a fresh connection.
    Auth {
        /// Session token issued at registration or recovery.
        token: String,
    },

    /// Keepalive sent while the channel is idle.
    Ping,

    /// Create or update a file.
    FileChange(FileChange),

    /// Delete a file.
    FileDelete { path: String },

    /// Create a directory.
    Mkdir { path: String },

    /// Remove a directory.
    Rmdir { path: String },

    /// Request a full filesystem snapshot.
    RequestSync {
        /// Only send changes after this backend marker, if given.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        since: Option<String>,
    },
}

impl ClientMessage {
    /// Creates an Auth message.
    pub fn auth(token: impl Into<String>) -> Self {
        ClientMessage::Auth {
            token: token.into(),
        }
    }

    /// Creates a Ping message.
    pub fn ping() -> Self {
        ClientMessage::Ping
    }

    /// Creates a FileChange message.
    pub fn file_change(change: FileChange) -> Self {
        ClientMessage::FileChange(change)
    }

    /// Creates a FileDelete message.
    pub fn file_delete(path: impl Into<String>) -> Self {
        ClientMessage::FileDelete { path: path.into() }
    }

    /// Creates a Mkdir message.
    pub fn mkdir(path: impl Into<String>) -> Self {
        ClientMessage::Mkdir { path: path.into() }
    }

    /// Creates a Rmdir message.
    pub fn rmdir(path: impl Into<String>) -> Self {
        ClientMessage::Rmdir { path: path.into() }
    }

    /// Creates a RequestSync message.
    pub fn request_sync(since: Option<String>) -> Self {
        ClientMessage::RequestSync { since }
    }

    /// Returns the wire type tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Auth { .. } => "auth",
            ClientMessage::Ping => "ping",
            ClientMessage::FileChange(_) => "file_change",
            ClientMessage::FileDelete { .. } => "file_delete",
            ClientMessage::Mkdir { .. } => "mkdir",
            ClientMessage::Rmdir { .. } => "rmdir",
            ClientMessage::RequestSync { .. } => "request_sync",
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Authentication accepted.
    AuthOk { handle: String },

    /// Keepalive answer.
    Pong,

    /// Backend-reported error. Not fatal to the channel.
    Error { code: String, message: String },

    /// A file was created or updated by another client.
    FileChanged(FileChange),

    /// A file was deleted by another client.
    FileDeleted { path: String },

    /// Complete filesystem snapshot.
    SyncData { files: Vec<FileChange> },

    /// Version history for one path.
    VersionsData(VersionHistory),

    /// A restore request was applied.
    VersionRestored { path: String, restored_version: u64 },

    /// `*_ok` acknowledgment of a mutation. Informational only.
    Ack { kind: String, payload: Value },

    /// `scene_*` echo, passed through verbatim.
    SceneEcho { kind: String, payload: Value },

    /// Any other type tag.
    Unknown { kind: String },
}

/// Wire shape of the inbound types with a fixed payload.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Tagged {
    AuthOk {
        #[serde(default)]
        handle: String,
    },
    Pong,
    Error {
        #[serde(default, deserialize_with = "string_or_number")]
        code: String,
        #[serde(default)]
        message: String,
    },
    FileChanged(FileChange),
    FileDeleted {
        path: String,
    },
    SyncData {
        #[serde(default)]
        files: Vec<FileChange>,
    },
    VersionsData(VersionHistory),
    VersionRestored {
        #[serde(default)]
        path: String,
        restored_version: u64,
    },
}

impl From<Tagged> for ServerMessage {
    fn from(tagged: Tagged) -> Self {
        match tagged {
            Tagged::AuthOk { handle } => ServerMessage::AuthOk { handle },
            Tagged::Pong => ServerMessage::Pong,
            Tagged::Error { code, message } => ServerMessage::Error { code, message },
            Tagged::FileChanged(change) => ServerMessage::FileChanged(change),
            Tagged::FileDeleted { path } => ServerMessage::FileDeleted { path },
            Tagged::SyncData { files } => ServerMessage::SyncData { files },
            Tagged::VersionsData(history) => ServerMessage::VersionsData(history),
            Tagged::VersionRestored {
                path,
                restored_version,
            } => ServerMessage::VersionRestored {
                path,
                restored_version,
            },
        }
    }
}

impl ServerMessage {
    /// Creates an AuthOk message.
    pub fn auth_ok(handle: impl Into<String>) -> Self {
        ServerMessage::AuthOk {
            handle: handle.into(),
        }
    }

    /// Creates an Error message.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Returns the wire type tag.
    pub fn kind(&self) -> &str {
        match self {
            ServerMessage::AuthOk { .. } => "auth_ok",
            ServerMessage::Pong => "pong",
            ServerMessage::Error { .. } => "error",
            ServerMessage::FileChanged(_) => "file_changed",
            ServerMessage::FileDeleted { .. } => "file_deleted",
            ServerMessage::SyncData { .. } => "sync_data",
            ServerMessage::VersionsData(_) => "versions_data",
            ServerMessage::VersionRestored { .. } => "version_restored",
            ServerMessage::Ack { kind, .. }
            | ServerMessage::SceneEcho { kind, .. }
            | ServerMessage::Unknown { kind } => kind,
        }
    }

    /// Decodes a frame that is already parsed as JSON.
    ///
    /// Known types whose payload does not match are reported as `Unknown`.
    pub fn from_value(value: Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if kind.starts_with("scene_") {
            return ServerMessage::SceneEcho {
                kind,
                payload: value,
            };
        }
        if kind.ends_with("_ok") && kind != "auth_ok" {
            return ServerMessage::Ack {
                kind,
                payload: value,
            };
        }

        match serde_json::from_value::<Tagged>(value) {
            Ok(tagged) => tagged.into(),
            Err(_) => ServerMessage::Unknown { kind },
        }
    }

    /// Deserializes the message from JSON.
    ///
    /// Fails only when the text is not a JSON value.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(s)?;
        Ok(Self::from_value(value))
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
