// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::sync::Mutex;

// Serializes tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_vars_constants() {
    assert_eq!(vars::NETSYNC_URL, "NETSYNC_URL");
    assert_eq!(vars::NETSYNC_CONFIG, "NETSYNC_CONFIG");
    assert_eq!(vars::NETSYNC_STATE_DIR, "NETSYNC_STATE_DIR");
    assert_eq!(vars::NETSYNC_LOG, "NETSYNC_LOG");
    assert_eq!(vars::RUST_LOG, "RUST_LOG");
}

#[test]
fn test_base_url_ignores_empty() {
    let _guard = ENV_MUTEX.lock().unwrap();
    std::env::set_var("NETSYNC_URL", "");
    assert_eq!(base_url(), None);
    std::env::set_var("NETSYNC_URL", "http://example.test");
    assert_eq!(base_url().as_deref(), Some("http://example.test"));
    std::env::remove_var("NETSYNC_URL");
}

#[test]
fn test_state_dir() {
    let _guard = ENV_MUTEX.lock().unwrap();
    std::env::set_var("NETSYNC_STATE_DIR", "/tmp/netsync-state");
    assert_eq!(state_dir(), Some(PathBuf::from("/tmp/netsync-state")));
    std::env::remove_var("NETSYNC_STATE_DIR");
    assert_eq!(state_dir(), None);
}

#[test]
fn test_log_filter_prefers_netsync_log() {
    let _guard = ENV_MUTEX.lock().unwrap();
    std::env::set_var("RUST_LOG", "info");
    std::env::set_var("NETSYNC_LOG", "debug");
    assert_eq!(log_filter().as_deref(), Some("debug"));
    std::env::remove_var("NETSYNC_LOG");
    assert_eq!(log_filter().as_deref(), Some("info"));
    std::env::remove_var("RUST_LOG");
    assert_eq!(log_filter(), None);
}
