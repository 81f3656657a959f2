// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session identity held by the client.
//!
//! All identity fields change together: a session is either fully
//! established by registration/recovery or fully cleared.

use serde::{Deserialize, Serialize};

/// Authenticated identity, persisted by the credential cache.
///
/// An empty `session_token` means there is no authenticated identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    pub registered: bool,
    pub handle: String,
    /// Contact address (email) given at registration, if any.
    pub contact_id: String,
    pub recovery_code: String,
    pub session_token: String,
}

impl Session {
    /// Creates a registered session from backend-issued credentials.
    pub fn established(
        handle: impl Into<String>,
        contact_id: impl Into<String>,
        recovery_code: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Session {
            registered: true,
            handle: handle.into(),
            contact_id: contact_id.into(),
            recovery_code: recovery_code.into(),
            session_token: session_token.into(),
        }
    }

    /// Returns true if a session token is present.
    pub fn is_authenticated(&self) -> bool {
        !self.session_token.is_empty()
    }

    /// Returns the session token, if present.
    pub fn token(&self) -> Option<&str> {
        if self.session_token.is_empty() {
            None
        } else {
            Some(&self.session_token)
        }
    }

    /// Replaces every field at once.
    pub fn replace(&mut self, other: Session) {
        *self = other;
    }

    /// Invalidates every identity field at once.
    pub fn clear(&mut self) {
        *self = Session::default();
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
