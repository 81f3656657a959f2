// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Stable per-installation client identifier.
//!
//! The identifier is generated once, persisted by the credential cache, and
//! sent to the backend as `browserId` on registration and recovery.

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Length of a client id in hex characters.
pub const CLIENT_ID_LEN: usize = 32;

/// Generates a fresh client id.
///
/// Format: first 16 bytes of SHA256(user + host + timestamp + pid), hex encoded.
pub fn generate_client_id() -> String {
    let input = format!(
        "{}{}{}{}",
        get_unix_username().unwrap_or_default(),
        get_hostname().unwrap_or_default(),
        Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true),
        std::process::id()
    );
    let hash = Sha256::digest(input.as_bytes());
    hex::encode(&hash[..CLIENT_ID_LEN / 2])
}

/// Validates a persisted client id, returning it trimmed.
pub fn parse_client_id(s: &str) -> Result<String> {
    let id = s.trim();
    let valid = id.len() == CLIENT_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if valid {
        Ok(id.to_string())
    } else {
        Err(Error::InvalidClientId(id.to_string()))
    }
}

fn get_unix_username() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .ok()
        .filter(|s| !s.is_empty())
}

fn get_hostname() -> Option<String> {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
