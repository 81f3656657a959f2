// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network synchronization client.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!   SyncHandle ──►│  SyncClient  │──► EventSink
//!                 │   (facade)   │
//!                 └──────┬───────┘
//!        ┌───────────────┼────────────────┐
//!        ▼               ▼                ▼
//! ┌─────────────┐ ┌─────────────┐ ┌───────────────┐
//! │ Supervisor  │ │ RequestGate │ │RealtimeChannel│
//! │  (probes)   │ │  + HTTP     │ │  (Transport)  │
//! └─────────────┘ └─────────────┘ └───────────────┘
//! ```
//!
//! # Features
//!
//! - Reachability probing with adaptive backoff
//! - Realtime channel with auth handshake, keepalive and reconnect backoff
//! - Request/reply fallback with a single-flight gate
//! - Injectable transports and event sink for testing

mod api;
mod channel;
mod client;
mod events;
mod gate;
mod http;
mod supervisor;
mod transport;

pub use api::AccountResponse;
pub use channel::{ChannelError, Phase, RealtimeChannel, TransportFactory};
pub use client::{
    ClientStatus, OpOutcome, Operation, Route, SkipReason, SyncClient, SyncHandle,
};
pub use events::{reason, EventSink, SyncEvent};
pub use gate::{PendingRequest, RequestGate, RequestKind};
pub use http::{
    HttpError, HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport,
    SESSION_TOKEN_HEADER,
};
pub use supervisor::{ConnectionState, ConnectivitySupervisor, Transition};
pub use transport::{Transport, TransportError, TransportResult, WebSocketTransport};

#[cfg(test)]
mod test_helpers;
