// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local credential cache.
//!
//! Stores the [`Session`] and the per-installation client id under the state
//! directory:
//!
//! ```text
//! <state dir>/
//!   session.json   # registered, handle, contactId, recoveryCode, sessionToken
//!   client_id      # 32 hex chars, written once
//! ```
//!
//! Writes go to a temp file that is renamed into place, so a crash never
//! leaves a half-written session behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use netsync_core::identity::{generate_client_id, parse_client_id};
use netsync_core::Session;

const SESSION_FILE_NAME: &str = "session.json";
const CLIENT_ID_FILE_NAME: &str = "client_id";

/// Error type for credential cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for credential cache operations.
pub type CredentialResult<T> = Result<T, CredentialError>;

/// Durable storage for session identity.
pub trait CredentialStore: Send + Sync {
    /// Loads the stored session.
    ///
    /// A missing or unreadable record yields an empty session.
    fn load_session(&self) -> Session;

    /// Persists the session, replacing any previous record.
    fn save_session(&self, session: &Session) -> CredentialResult<()>;

    /// Returns the client id, generating and persisting one on first use.
    fn client_id(&self) -> CredentialResult<String>;
}

/// File-backed credential store.
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: &Path) -> CredentialResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(FileCredentialStore {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE_NAME)
    }

    fn client_id_path(&self) -> PathBuf {
        self.dir.join(CLIENT_ID_FILE_NAME)
    }
}

impl CredentialStore for FileCredentialStore {
    fn load_session(&self) -> Session {
        let path = self.session_path();
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Session::default(),
            Err(e) => {
                tracing::warn!("failed to read {}: {}", path.display(), e);
                return Session::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("ignoring corrupt session at {}: {}", path.display(), e);
                Session::default()
            }
        }
    }

    fn save_session(&self, session: &Session) -> CredentialResult<()> {
        let json = serde_json::to_string_pretty(session)?;
        write_atomic(&self.session_path(), json.as_bytes())?;
        Ok(())
    }

    fn client_id(&self) -> CredentialResult<String> {
        let path = self.client_id_path();
        match fs::read_to_string(&path) {
            Ok(content) => match parse_client_id(&content) {
                Ok(id) => return Ok(id),
                Err(e) => tracing::warn!("regenerating client id: {}", e),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let id = generate_client_id();
        write_atomic(&path, id.as_bytes())?;
        tracing::debug!("generated client id {}", id);
        Ok(id)
    }
}

/// Writes `contents` to a sibling temp file, fsyncs it, and renames it over `path`.
fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}

/// In-memory credential store for ephemeral runs and tests.
///
/// Clones share the same underlying record.
#[derive(Clone)]
pub struct MemoryCredentialStore {
    session: Arc<Mutex<Session>>,
    client_id: String,
    saves: Arc<Mutex<usize>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::with_session(Session::default())
    }

    pub fn with_session(session: Session) -> Self {
        MemoryCredentialStore {
            session: Arc::new(Mutex::new(session)),
            client_id: generate_client_id(),
            saves: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of times `save_session` has been called.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or_default()
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load_session(&self) -> Session {
        self.session
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn save_session(&self, session: &Session) -> CredentialResult<()> {
        if let Ok(mut stored) = self.session.lock() {
            *stored = session.clone();
        }
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }

    fn client_id(&self) -> CredentialResult<String> {
        Ok(self.client_id.clone())
    }
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
