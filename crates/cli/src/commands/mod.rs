// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command implementations.
//!
//! Each one-shot command starts a client, waits for the first probe to
//! settle, issues one operation and waits for the event that completes it.

pub mod account;
pub mod files;
pub mod output;
pub mod watch;

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::cli::GlobalArgs;
use crate::config::{self, ClientConfig};
use crate::credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use crate::error::{Error, Result};
use crate::sync::{reason, ClientStatus, OpOutcome, Operation, SyncClient, SyncEvent, SyncHandle};

/// How often readiness is polled while waiting for the first probe.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Loads the config and applies the `--url` override.
pub fn load_config(global: &GlobalArgs) -> Result<ClientConfig> {
    let mut config = ClientConfig::load_default()?;
    if let Some(ref url) = global.url {
        config.base_url = url.clone();
        config.validate()?;
    }
    Ok(config)
}

fn open_credentials(ephemeral: bool) -> Result<Box<dyn CredentialStore>> {
    if ephemeral {
        return Ok(Box::new(MemoryCredentialStore::new()));
    }
    Ok(Box::new(FileCredentialStore::open(&config::state_dir())?))
}

/// A running client plus the receiving end of its events.
pub struct Runner {
    handle: SyncHandle,
    events: mpsc::UnboundedReceiver<SyncEvent>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    base_url: String,
    json: bool,
    wait: Duration,
}

impl Runner {
    pub fn start(global: &GlobalArgs) -> Result<Self> {
        let config = load_config(global)?;
        let base_url = config.base_url().to_string();
        let credentials = open_credentials(global.ephemeral)?;
        let (tx, events) = mpsc::unbounded_channel();
        let client = SyncClient::new(config, credentials, Box::new(tx))?;
        let cancel = CancellationToken::new();
        let (handle, task) = client.spawn(cancel.clone());
        Ok(Runner {
            handle,
            events,
            cancel,
            task,
            base_url,
            json: global.json,
            wait: Duration::from_secs(global.wait),
        })
    }

    pub fn json(&self) -> bool {
        self.json
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn status(&self) -> Result<ClientStatus> {
        self.handle.status().await
    }

    /// Waits for the first probe to settle. Returns whether the backend is
    /// reachable.
    pub async fn wait_online(&self) -> Result<bool> {
        let deadline = Instant::now() + self.wait;
        loop {
            let status = self.handle.status().await?;
            if status.online {
                return Ok(true);
            }
            if status.consecutive_failures > 0 || Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Submits an operation, turning a skipped or busy outcome into an error.
    pub async fn submit(&self, operation: &str, op: Operation) -> Result<OpOutcome> {
        let outcome = self.handle.submit(op).await?;
        if outcome.is_accepted() {
            return Ok(outcome);
        }
        Err(Error::Skipped {
            operation: operation.to_string(),
            reason: outcome.reason().unwrap_or(reason::REQUEST_FAILED).to_string(),
        })
    }

    /// Waits for the first event accepted by `done`.
    pub async fn wait_for(&mut self, what: &str, done: impl Fn(&SyncEvent) -> bool) -> Result<SyncEvent> {
        let deadline = Instant::now() + self.wait;
        loop {
            let event = tokio::time::timeout_at(deadline, self.events.recv())
                .await
                .map_err(|_| Error::Timeout(what.to_string()))?
                .ok_or(Error::ClientStopped)?;
            if done(&event) {
                return Ok(event);
            }
            tracing::debug!(event = event.name(), "skipping event");
        }
    }

    /// Next event with no deadline. `None` once the client stops.
    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        self.events.recv().await
    }

    /// Prints an event as JSON or as a human-readable line.
    pub fn report(&self, event: &SyncEvent) -> Result<()> {
        if self.json {
            print_json(event)
        } else {
            println!("{}", output::describe(event));
            Ok(())
        }
    }

    /// Stops the client and returns `result`.
    pub async fn finish<T>(self, result: Result<T>) -> Result<T> {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!("sync task ended abnormally: {}", e);
        }
        result
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

pub fn failed(operation: &str, reason: impl Into<String>) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        reason: reason.into(),
    }
}
