// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for netsync-core operations.

use thiserror::Error;

/// All possible errors that can occur in netsync-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid client id: '{0}'\n  hint: client ids are 32 lowercase hex characters")]
    InvalidClientId(String),
}

/// A specialized Result type for netsync-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
