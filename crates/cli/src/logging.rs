// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Diagnostic logging on stderr.
//!
//! Stdout carries command output, so logs always go to stderr.

use tracing_subscriber::EnvFilter;

use crate::env;

const DEFAULT_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "netsync=debug,netsync_core=debug,info";

/// Filter directive: `--verbose` wins, then the environment, then the default.
pub fn filter_directive(verbose: bool, from_env: Option<String>) -> String {
    if verbose {
        return VERBOSE_FILTER.to_string();
    }
    from_env.unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

pub fn init(verbose: bool) {
    let directive = filter_directive(verbose, env::log_filter());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
