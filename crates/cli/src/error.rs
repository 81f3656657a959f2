// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::credentials::CredentialError;
use crate::sync::HttpError;

/// All possible errors that can occur in the netsync library.
///
/// Protocol outcomes (offline, busy, rejected by the backend) are not errors;
/// they are reported as [`OpOutcome`](crate::sync::OpOutcome) values and
/// [`SyncEvent`](crate::sync::SyncEvent)s. These variants cover setup and
/// local I/O failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid base url '{0}'\n  hint: use http://host:port or https://host")]
    InvalidUrl(String),

    #[error("credential cache error: {0}")]
    Credentials(#[from] CredentialError),

    #[error("request error: {0}")]
    Http(#[from] HttpError),

    #[error("sync client is not running")]
    ClientStopped,

    #[error("{operation} skipped: {reason}")]
    Skipped { operation: String, reason: String },

    #[error("{operation} failed: {reason}")]
    OperationFailed { operation: String, reason: String },

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] netsync_core::Error),
}

/// A specialized Result type for netsync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
