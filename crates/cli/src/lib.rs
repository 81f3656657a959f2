// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! netsync - client for a file-sync backend.
//!
//! Keeps a view of backend reachability, a realtime channel for push
//! updates and low-latency mutations, and a single-flight request/reply
//! path for everything else.
//!
//! # Main Components
//!
//! - [`SyncClient`] - the facade; owns every other component
//! - [`ConnectivitySupervisor`](sync::ConnectivitySupervisor) - health probes and backoff
//! - [`RequestGate`](sync::RequestGate) - at most one request/reply call in flight
//! - [`RealtimeChannel`](sync::RealtimeChannel) - WebSocket lifecycle and dispatch
//! - [`CredentialStore`](credentials::CredentialStore) - local session cache
//!
//! # Usage
//!
//! ```rust,ignore
//! use netsync::{ClientConfig, SyncClient};
//! use netsync::credentials::FileCredentialStore;
//!
//! let config = ClientConfig::load_default()?;
//! let store = FileCredentialStore::open(&netsync::config::state_dir())?;
//! let (tx, mut events) = tokio::sync::mpsc::unbounded_channel();
//! let client = SyncClient::new(config, Box::new(store), Box::new(tx))?;
//! let (handle, task) = client.spawn(CancellationToken::new());
//! handle.write_file(FileChange::new("notes/a.txt", "hello", "text")).await?;
//! ```

mod cli;
mod commands;

pub mod config;
pub mod credentials;
pub mod env;
pub mod error;
pub mod logging;
pub mod sync;

pub use cli::{Cli, Command, GlobalArgs};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use sync::{OpOutcome, Operation, SyncClient, SyncEvent, SyncHandle};

/// Runs one CLI command to completion.
pub async fn run(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Command::Status => commands::account::status(&global).await,
        Command::Register { handle, email } => {
            commands::account::register(&global, handle, email).await
        }
        Command::Recover { code } => commands::account::recover(&global, code).await,
        Command::CheckHandle { handle } => commands::account::check_handle(&global, handle).await,
        Command::CheckEmail { email } => commands::account::check_email(&global, email).await,
        Command::Logout => commands::account::logout(&global).await,
        Command::Put {
            path,
            file,
            file_type,
            program,
        } => commands::files::put(&global, path, &file, file_type, program).await,
        Command::Rm { path } => commands::files::rm(&global, path).await,
        Command::Mkdir { path } => commands::files::mkdir(&global, path).await,
        Command::Rmdir { path } => commands::files::rmdir(&global, path).await,
        Command::History { path } => commands::files::history(&global, path).await,
        Command::Restore { path, version } => {
            commands::files::restore(&global, path, version).await
        }
        Command::Sync { since } => commands::files::sync(&global, since).await,
        Command::Push { file } => commands::files::push(&global, &file).await,
        Command::Pull => commands::files::pull(&global).await,
        Command::Watch => commands::watch::watch(&global).await,
    }
}
