// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the client are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `NETSYNC_URL` if set and non-empty.
pub fn base_url() -> Option<String> {
    std::env::var(vars::NETSYNC_URL)
        .ok()
        .filter(|s| !s.is_empty())
}

/// Returns the value of `NETSYNC_CONFIG` if set.
pub fn config_path() -> Option<PathBuf> {
    std::env::var(vars::NETSYNC_CONFIG).ok().map(PathBuf::from)
}

/// Returns the value of `NETSYNC_STATE_DIR` if set.
pub fn state_dir() -> Option<PathBuf> {
    std::env::var(vars::NETSYNC_STATE_DIR)
        .ok()
        .map(PathBuf::from)
}

/// Returns the log filter directive: `NETSYNC_LOG`, then `RUST_LOG`.
pub fn log_filter() -> Option<String> {
    std::env::var(vars::NETSYNC_LOG)
        .or_else(|_| std::env::var(vars::RUST_LOG))
        .ok()
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
