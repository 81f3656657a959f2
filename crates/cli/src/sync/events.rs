// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Events delivered to the application.
//!
//! Every asynchronous result of the client (connectivity flips, realtime
//! lifecycle, request/reply completions, remote pushes) reaches the
//! application as a [`SyncEvent`] through an [`EventSink`].

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use netsync_core::{FileChange, VersionHistory};

use super::gate::RequestKind;

/// Reason codes carried by failure events and skipped outcomes.
pub mod reason {
    pub const OFFLINE: &str = "offline";
    pub const NOT_AUTHENTICATED: &str = "not_authenticated";
    pub const REALTIME_UNAVAILABLE: &str = "realtime_unavailable";
    pub const REQUEST_IN_PROGRESS: &str = "request_in_progress";
    pub const REQUEST_FAILED: &str = "request_failed";
    pub const TAKEN: &str = "taken";
}

/// Something the application may want to react to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    /// The backend became reachable or unreachable.
    ConnectivityChanged { online: bool },

    /// The realtime transport opened; authentication is in progress.
    RealtimeConnected,
    /// The backend accepted the session token.
    RealtimeAuthenticated { handle: String },
    /// An open realtime channel closed.
    RealtimeDisconnected,

    /// Registration succeeded. `payload` is the backend response verbatim.
    Registered { payload: Value },
    RegistrationFailed { reason: String },
    /// Recovery succeeded. `payload` is the backend response verbatim.
    Recovered { payload: Value },
    RecoveryFailed { reason: String },
    /// The session was cleared locally.
    LoggedOut,

    HandleAvailability {
        handle: String,
        available: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    ContactAvailability {
        contact: String,
        available: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// A request/reply mutation was accepted by the backend.
    MutationApplied { kind: RequestKind, path: String },
    MutationFailed {
        kind: RequestKind,
        path: String,
        reason: String,
    },

    FilesystemPushed,
    FilesystemFetched { filesystem: Value },
    FilesystemSyncFailed { reason: String },

    /// Another client changed a file.
    FileChanged(FileChange),
    /// Another client deleted a file.
    FileDeleted { path: String },
    /// Complete filesystem snapshot from the realtime channel.
    FullSync { files: Vec<FileChange> },

    VersionHistory(VersionHistory),
    VersionHistoryFailed { path: String, reason: String },
    VersionRestored { path: String, version: u64 },
    RestoreFailed {
        path: String,
        version: u64,
        reason: String,
    },

    /// Opaque `scene_*` payload for the scene collaborator.
    SceneEcho { kind: String, payload: Value },
    /// Error notice pushed on the realtime channel.
    ServerError { code: String, message: String },
}

impl SyncEvent {
    /// Snake-case name of the event, as serialized in the `event` field.
    pub fn name(&self) -> &'static str {
        match self {
            SyncEvent::ConnectivityChanged { .. } => "connectivity_changed",
            SyncEvent::RealtimeConnected => "realtime_connected",
            SyncEvent::RealtimeAuthenticated { .. } => "realtime_authenticated",
            SyncEvent::RealtimeDisconnected => "realtime_disconnected",
            SyncEvent::Registered { .. } => "registered",
            SyncEvent::RegistrationFailed { .. } => "registration_failed",
            SyncEvent::Recovered { .. } => "recovered",
            SyncEvent::RecoveryFailed { .. } => "recovery_failed",
            SyncEvent::LoggedOut => "logged_out",
            SyncEvent::HandleAvailability { .. } => "handle_availability",
            SyncEvent::ContactAvailability { .. } => "contact_availability",
            SyncEvent::MutationApplied { .. } => "mutation_applied",
            SyncEvent::MutationFailed { .. } => "mutation_failed",
            SyncEvent::FilesystemPushed => "filesystem_pushed",
            SyncEvent::FilesystemFetched { .. } => "filesystem_fetched",
            SyncEvent::FilesystemSyncFailed { .. } => "filesystem_sync_failed",
            SyncEvent::FileChanged(_) => "file_changed",
            SyncEvent::FileDeleted { .. } => "file_deleted",
            SyncEvent::FullSync { .. } => "full_sync",
            SyncEvent::VersionHistory(_) => "version_history",
            SyncEvent::VersionHistoryFailed { .. } => "version_history_failed",
            SyncEvent::VersionRestored { .. } => "version_restored",
            SyncEvent::RestoreFailed { .. } => "restore_failed",
            SyncEvent::SceneEcho { .. } => "scene_echo",
            SyncEvent::ServerError { .. } => "server_error",
        }
    }
}

/// Observer receiving client events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SyncEvent);
}

impl EventSink for mpsc::UnboundedSender<SyncEvent> {
    fn emit(&self, event: SyncEvent) {
        // A dropped receiver means nobody is listening anymore
        let _ = self.send(event);
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
