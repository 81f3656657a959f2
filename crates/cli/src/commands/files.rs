// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! File commands: mutations, version history, full sync and snapshots.

use std::path::Path;

use serde_json::Value;

use netsync_core::FileChange;

use super::{failed, output, print_json, Runner};
use crate::cli::GlobalArgs;
use crate::error::{Error, Result};
use crate::sync::{reason, OpOutcome, Operation, RequestKind, Route, SyncEvent};

pub async fn put(
    global: &GlobalArgs,
    path: String,
    file: &Path,
    file_type: String,
    program: Option<String>,
) -> Result<()> {
    let content = std::fs::read_to_string(file)?;
    let mut change = FileChange::new(path, content, file_type);
    if let Some(program) = program {
        change = change.with_program(program);
    }
    let mut runner = Runner::start(global)?;
    let result = run_mutation(&mut runner, RequestKind::WriteFile, Operation::WriteFile(change)).await;
    runner.finish(result).await
}

pub async fn rm(global: &GlobalArgs, path: String) -> Result<()> {
    mutate(global, RequestKind::DeleteFile, Operation::DeleteFile { path }).await
}

pub async fn mkdir(global: &GlobalArgs, path: String) -> Result<()> {
    mutate(global, RequestKind::CreateDirectory, Operation::CreateDirectory { path }).await
}

pub async fn rmdir(global: &GlobalArgs, path: String) -> Result<()> {
    mutate(global, RequestKind::RemoveDirectory, Operation::RemoveDirectory { path }).await
}

async fn mutate(global: &GlobalArgs, kind: RequestKind, op: Operation) -> Result<()> {
    let mut runner = Runner::start(global)?;
    let result = run_mutation(&mut runner, kind, op).await;
    runner.finish(result).await
}

fn mutation_path(op: &Operation) -> &str {
    match op {
        Operation::WriteFile(change) => &change.path,
        Operation::DeleteFile { path }
        | Operation::CreateDirectory { path }
        | Operation::RemoveDirectory { path } => path,
        _ => "",
    }
}

/// Sends a mutation. Realtime sends complete immediately; request/reply
/// sends wait for the backend's answer.
async fn run_mutation(runner: &mut Runner, kind: RequestKind, op: Operation) -> Result<()> {
    let path = mutation_path(&op).to_string();
    runner.wait_online().await?;
    let outcome = runner.submit(kind.as_str(), op).await?;
    if outcome == OpOutcome::Sent(Route::Realtime) {
        if !runner.json() {
            println!("{} {}: sent", kind, path);
        }
        return Ok(());
    }
    let event = runner
        .wait_for(kind.as_str(), |e| match e {
            SyncEvent::MutationApplied { kind: k, path: p }
            | SyncEvent::MutationFailed {
                kind: k, path: p, ..
            } => *k == kind && *p == path,
            _ => false,
        })
        .await?;
    if let SyncEvent::MutationFailed { reason, .. } = &event {
        return Err(failed(kind.as_str(), reason.clone()));
    }
    runner.report(&event)
}

pub async fn history(global: &GlobalArgs, path: String) -> Result<()> {
    let mut runner = Runner::start(global)?;
    let result = run_history(&mut runner, path).await;
    runner.finish(result).await
}

async fn run_history(runner: &mut Runner, path: String) -> Result<()> {
    runner.wait_online().await?;
    runner
        .submit("history", Operation::FetchVersions { path: path.clone() })
        .await?;
    let event = runner
        .wait_for("version history", |e| match e {
            SyncEvent::VersionHistory(h) => h.path == path,
            SyncEvent::VersionHistoryFailed { path: p, .. } => *p == path,
            _ => false,
        })
        .await?;
    match &event {
        SyncEvent::VersionHistory(_) if runner.json() => print_json(&event),
        SyncEvent::VersionHistory(history) => {
            println!("{}", output::format_history(history));
            Ok(())
        }
        SyncEvent::VersionHistoryFailed { reason, .. } => Err(failed("history", reason.clone())),
        _ => Ok(()),
    }
}

pub async fn restore(global: &GlobalArgs, path: String, version: u64) -> Result<()> {
    let mut runner = Runner::start(global)?;
    let result = run_restore(&mut runner, path, version).await;
    runner.finish(result).await
}

async fn run_restore(runner: &mut Runner, path: String, version: u64) -> Result<()> {
    runner.wait_online().await?;
    runner
        .submit(
            "restore",
            Operation::RestoreVersion {
                path: path.clone(),
                version,
            },
        )
        .await?;
    let event = runner
        .wait_for("restore", |e| match e {
            SyncEvent::VersionRestored { path: p, .. } | SyncEvent::RestoreFailed { path: p, .. } => {
                *p == path
            }
            _ => false,
        })
        .await?;
    if let SyncEvent::RestoreFailed { reason, .. } = &event {
        return Err(failed("restore", reason.clone()));
    }
    runner.report(&event)
}

pub async fn sync(global: &GlobalArgs, since: Option<String>) -> Result<()> {
    let mut runner = Runner::start(global)?;
    let result = run_sync(&mut runner, since).await;
    runner.finish(result).await
}

/// Full sync only travels over the realtime channel, so this waits for the
/// channel to authenticate first.
async fn run_sync(runner: &mut Runner, since: Option<String>) -> Result<()> {
    if !runner.wait_online().await? {
        return Err(Error::Skipped {
            operation: "sync".to_string(),
            reason: reason::OFFLINE.to_string(),
        });
    }
    if !runner.status().await?.authenticated {
        return Err(Error::Skipped {
            operation: "sync".to_string(),
            reason: reason::NOT_AUTHENTICATED.to_string(),
        });
    }
    runner
        .wait_for("realtime authentication", |e| {
            matches!(e, SyncEvent::RealtimeAuthenticated { .. })
        })
        .await?;
    runner
        .submit("sync", Operation::RequestFullSync { since })
        .await?;
    let event = runner
        .wait_for("full sync", |e| matches!(e, SyncEvent::FullSync { .. }))
        .await?;
    match &event {
        SyncEvent::FullSync { files } if !runner.json() => {
            for file in files {
                println!("{:<32} {:<8} {}", file.path, file.file_type, output::preview(&file.content));
            }
            println!("{} files", files.len());
            Ok(())
        }
        _ => print_json(&event),
    }
}

pub async fn push(global: &GlobalArgs, file: &Path) -> Result<()> {
    let filesystem: Value = serde_json::from_str(&std::fs::read_to_string(file)?)?;
    let mut runner = Runner::start(global)?;
    let result = run_push(&mut runner, filesystem).await;
    runner.finish(result).await
}

async fn run_push(runner: &mut Runner, filesystem: Value) -> Result<()> {
    runner.wait_online().await?;
    runner
        .submit("push", Operation::PushFilesystem { filesystem })
        .await?;
    let event = runner
        .wait_for("push", |e| {
            matches!(
                e,
                SyncEvent::FilesystemPushed | SyncEvent::FilesystemSyncFailed { .. }
            )
        })
        .await?;
    if let SyncEvent::FilesystemSyncFailed { reason } = &event {
        return Err(failed("push", reason.clone()));
    }
    runner.report(&event)
}

pub async fn pull(global: &GlobalArgs) -> Result<()> {
    let mut runner = Runner::start(global)?;
    let result = run_pull(&mut runner).await;
    runner.finish(result).await
}

async fn run_pull(runner: &mut Runner) -> Result<()> {
    runner.wait_online().await?;
    runner.submit("pull", Operation::FetchFilesystem).await?;
    let event = runner
        .wait_for("pull", |e| {
            matches!(
                e,
                SyncEvent::FilesystemFetched { .. } | SyncEvent::FilesystemSyncFailed { .. }
            )
        })
        .await?;
    match event {
        SyncEvent::FilesystemFetched { filesystem } => {
            println!("{}", serde_json::to_string_pretty(&filesystem)?);
            Ok(())
        }
        SyncEvent::FilesystemSyncFailed { reason } => Err(failed("pull", reason)),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;
