// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! netsync-core: Shared data types for the netsync client
//!
//! This crate provides the session record, file and version payloads, and the
//! realtime wire protocol used by the `netsync` client and its tests.

pub mod error;
pub mod files;
pub mod identity;
pub mod protocol;
pub mod session;

pub use error::{Error, Result};
pub use files::{FileChange, VersionHistory, VersionRecord};
pub use protocol::{ClientMessage, ServerMessage};
pub use session::Session;
