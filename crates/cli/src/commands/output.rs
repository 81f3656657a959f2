// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable rendering of client state and events.

use netsync_core::VersionHistory;

use crate::sync::{ClientStatus, SyncEvent};

/// Longest content preview shown in history listings.
const PREVIEW_WIDTH: usize = 48;

/// One-line preview of file content: first line only, truncated.
pub fn preview(content: &str) -> String {
    let first = content.lines().next().unwrap_or("");
    let more = content.contains('\n');
    if first.chars().count() > PREVIEW_WIDTH {
        let cut: String = first.chars().take(PREVIEW_WIDTH - 3).collect();
        format!("{}...", cut)
    } else if more {
        format!("{}...", first)
    } else {
        first.to_string()
    }
}

pub fn format_status(base_url: &str, status: &ClientStatus) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Backend:   {}", base_url));
    lines.push(format!(
        "Reachable: {}",
        if status.online { "yes" } else { "no" }
    ));
    if !status.online && status.consecutive_failures > 0 {
        lines.push(format!(
            "Retry in:  {}s ({} failed probes)",
            status.retry_interval_secs, status.consecutive_failures
        ));
    }
    if status.authenticated {
        lines.push(format!("Handle:    {}", status.handle));
    } else {
        lines.push("Handle:    (not registered)".to_string());
    }
    lines.push(format!("Realtime:  {}", status.realtime));
    if let Some(kind) = status.pending_request {
        lines.push(format!("Pending:   {}", kind));
    }
    lines.join("\n")
}

pub fn format_history(history: &VersionHistory) -> String {
    let mut lines = vec![format!("{} (current: v{})", history.path, history.current)];
    if history.versions.is_empty() {
        lines.push("  no versions".to_string());
    } else if history.get(history.current).is_none() {
        lines.push(format!("  v{} is not in the listed versions", history.current));
    }
    for record in &history.versions {
        let marker = if record.version == history.current {
            "*"
        } else {
            " "
        };
        lines.push(format!(
            "{} v{:<4} {:<24} {}",
            marker,
            record.version,
            record.timestamp,
            preview(&record.content)
        ));
    }
    lines.join("\n")
}

/// Single line describing an event.
pub fn describe(event: &SyncEvent) -> String {
    match event {
        SyncEvent::ConnectivityChanged { online: true } => "backend reachable".to_string(),
        SyncEvent::ConnectivityChanged { online: false } => "backend unreachable".to_string(),
        SyncEvent::RealtimeConnected => "realtime connected".to_string(),
        SyncEvent::RealtimeAuthenticated { handle } => {
            format!("realtime authenticated as {}", handle)
        }
        SyncEvent::RealtimeDisconnected => "realtime disconnected".to_string(),
        SyncEvent::Registered { payload } | SyncEvent::Recovered { payload } => {
            let handle = payload
                .get("handle")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let verb = if matches!(event, SyncEvent::Registered { .. }) {
                "registered"
            } else {
                "recovered"
            };
            format!("{} {}", verb, handle)
        }
        SyncEvent::RegistrationFailed { reason } => format!("registration failed: {}", reason),
        SyncEvent::RecoveryFailed { reason } => format!("recovery failed: {}", reason),
        SyncEvent::LoggedOut => "logged out".to_string(),
        SyncEvent::HandleAvailability {
            handle, available, ..
        } => availability(handle, *available),
        SyncEvent::ContactAvailability {
            contact, available, ..
        } => availability(contact, *available),
        SyncEvent::MutationApplied { kind, path } => format!("{} {}: ok", kind, path),
        SyncEvent::MutationFailed { kind, path, reason } => {
            format!("{} {}: {}", kind, path, reason)
        }
        SyncEvent::FilesystemPushed => "filesystem pushed".to_string(),
        SyncEvent::FilesystemFetched { .. } => "filesystem fetched".to_string(),
        SyncEvent::FilesystemSyncFailed { reason } => {
            format!("filesystem sync failed: {}", reason)
        }
        SyncEvent::FileChanged(change) => format!("changed {}", change.path),
        SyncEvent::FileDeleted { path } => format!("deleted {}", path),
        SyncEvent::FullSync { files } => format!("full sync: {} files", files.len()),
        SyncEvent::VersionHistory(history) => format!(
            "history {}: {} versions",
            history.path,
            history.versions.len()
        ),
        SyncEvent::VersionHistoryFailed { path, reason } => {
            format!("history {} failed: {}", path, reason)
        }
        SyncEvent::VersionRestored { path, version } => {
            format!("restored {} to v{}", path, version)
        }
        SyncEvent::RestoreFailed {
            path,
            version,
            reason,
        } => format!("restore {} to v{} failed: {}", path, version, reason),
        SyncEvent::SceneEcho { kind, .. } => format!("scene event {}", kind),
        SyncEvent::ServerError { code, message } => format!("server error {}: {}", code, message),
    }
}

fn availability(subject: &str, available: bool) -> String {
    if available {
        format!("{} is available", subject)
    } else {
        format!("{} is taken", subject)
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
