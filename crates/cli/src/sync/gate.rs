// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight gate for request/reply calls.
//!
//! At most one request/reply call may be outstanding. A second caller is
//! rejected, never queued. Every successful [`RequestGate::try_acquire`] must be
//! matched by exactly one [`RequestGate::release`] on every completion path.

use serde::Serialize;
use tokio::time::Instant;

/// Request/reply operations that go through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Register,
    Recover,
    CheckHandle,
    CheckContact,
    PushFilesystem,
    FetchFilesystem,
    WriteFile,
    DeleteFile,
    CreateDirectory,
    RemoveDirectory,
    FetchVersions,
    RestoreVersion,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Register => "register",
            RequestKind::Recover => "recover",
            RequestKind::CheckHandle => "check_handle",
            RequestKind::CheckContact => "check_contact",
            RequestKind::PushFilesystem => "push_filesystem",
            RequestKind::FetchFilesystem => "fetch_filesystem",
            RequestKind::WriteFile => "write_file",
            RequestKind::DeleteFile => "delete_file",
            RequestKind::CreateDirectory => "create_directory",
            RequestKind::RemoveDirectory => "remove_directory",
            RequestKind::FetchVersions => "fetch_versions",
            RequestKind::RestoreVersion => "restore_version",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The call currently holding the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub kind: RequestKind,
    pub issued_at: Instant,
}

/// Mutual exclusion for request/reply calls.
#[derive(Debug, Default)]
pub struct RequestGate {
    pending: Option<PendingRequest>,
}

impl RequestGate {
    pub fn new() -> Self {
        RequestGate { pending: None }
    }

    /// Marks `kind` as pending. Returns false if another call is pending.
    pub fn try_acquire(&mut self, kind: RequestKind) -> bool {
        if let Some(ref current) = self.pending {
            tracing::debug!("{} rejected: {} in progress", kind, current.kind);
            return false;
        }
        self.pending = Some(PendingRequest {
            kind,
            issued_at: Instant::now(),
        });
        true
    }

    /// Clears the pending marker, returning what was pending.
    pub fn release(&mut self) -> Option<PendingRequest> {
        let released = self.pending.take();
        if released.is_none() {
            tracing::debug!("gate released while idle");
        }
        released
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
