// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime channel lifecycle.
//!
//! Drives one persistent connection through
//! Disconnected → Connecting → Open → Authenticated → Closing → Disconnected.
//! Connect attempts run off-loop as futures produced by [`RealtimeChannel::start_connect`];
//! their results come back through [`RealtimeChannel::on_connected`] and are
//! dropped when a newer attempt (or a forced disconnect) has superseded them.
//!
//! Events for the application are buffered and drained with
//! [`RealtimeChannel::take_events`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use netsync_core::{ClientMessage, ServerMessage};

use super::events::SyncEvent;
use super::transport::{Transport, TransportError, TransportResult};
use crate::config::RealtimeConfig;

/// Creates a fresh transport for each connect attempt.
pub type TransportFactory<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// A pending connect attempt: its sequence number and the connected transport.
pub type ConnectFuture<T> = Pin<Box<dyn Future<Output = (u64, TransportResult<T>)> + Send>>;

/// Lifecycle phase of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    Connecting,
    Open,
    Authenticated,
    Closing,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Disconnected => "disconnected",
            Phase::Connecting => "connecting",
            Phase::Open => "open",
            Phase::Authenticated => "authenticated",
            Phase::Closing => "closing",
        }
    }

    /// Whether the transport has been opened on this attempt.
    pub fn is_open(&self) -> bool {
        matches!(self, Phase::Open | Phase::Authenticated)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for channel sends.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel is connected but `auth_ok` has not arrived.
    #[error("realtime channel not authenticated")]
    NotAuthenticated,

    /// There is no open connection.
    #[error("realtime channel not connected")]
    NotConnected,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub struct RealtimeChannel<T: Transport> {
    url: String,
    config: RealtimeConfig,
    factory: TransportFactory<T>,
    transport: Option<T>,
    phase: Phase,
    reconnect_delay: Duration,
    reconnect_at: Option<Instant>,
    last_activity: Instant,
    attempt: u64,
    handle: Option<String>,
    events: Vec<SyncEvent>,
}

impl<T: Transport + 'static> RealtimeChannel<T> {
    pub fn new(url: impl Into<String>, config: RealtimeConfig, factory: TransportFactory<T>) -> Self {
        let reconnect_delay = config.initial_reconnect_delay();
        RealtimeChannel {
            url: url.into(),
            config,
            factory,
            transport: None,
            phase: Phase::Disconnected,
            reconnect_delay,
            reconnect_at: None,
            last_activity: Instant::now(),
            attempt: 0,
            handle: None,
            events: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == Phase::Authenticated
    }

    /// Handle confirmed by the last `auth_ok`.
    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }

    /// Sequence number of the most recent connect attempt.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Delay that the next failed or dropped attempt will wait.
    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// When a scheduled reconnect is due, if any.
    pub fn reconnect_at(&self) -> Option<Instant> {
        self.reconnect_at
    }

    pub fn cancel_reconnect(&mut self) {
        self.reconnect_at = None;
    }

    /// Drain buffered events in the order they occurred.
    pub fn take_events(&mut self) -> Vec<SyncEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begin a connect attempt from the Disconnected phase.
    ///
    /// Returns `None` if an attempt is already in progress or the channel is
    /// connected. The returned future is independent of the channel and can
    /// be spawned.
    pub fn start_connect(&mut self) -> Option<ConnectFuture<T>> {
        if self.phase != Phase::Disconnected {
            return None;
        }
        self.attempt += 1;
        self.phase = Phase::Connecting;
        self.reconnect_at = None;

        let attempt = self.attempt;
        let url = self.url.clone();
        let mut transport = (self.factory)();
        tracing::debug!(attempt, url = %url, "connecting realtime channel");
        Some(Box::pin(async move {
            let result = transport.connect(&url).await;
            (attempt, result.map(|()| transport))
        }))
    }

    /// Apply the outcome of a connect attempt.
    ///
    /// On success the channel is Open and the authenticate message carrying
    /// `token` has been sent.
    pub async fn on_connected(&mut self, attempt: u64, result: TransportResult<T>, token: &str) {
        if attempt != self.attempt || self.phase != Phase::Connecting {
            tracing::debug!(attempt, "discarding stale connect attempt");
            if let Ok(mut stale) = result {
                let _ = stale.disconnect().await;
            }
            return;
        }

        match result {
            Ok(transport) => {
                self.transport = Some(transport);
                self.phase = Phase::Open;
                self.last_activity = Instant::now();
                tracing::info!("realtime channel open");
                self.events.push(SyncEvent::RealtimeConnected);
                if let Err(e) = self.send_raw(ClientMessage::auth(token)).await {
                    tracing::warn!("failed to send auth: {}", e);
                    self.handle_closed().await;
                }
            }
            Err(e) => {
                tracing::debug!("realtime connect failed: {}", e);
                self.phase = Phase::Disconnected;
                self.schedule_reconnect();
            }
        }
    }

    /// Receive the next inbound message.
    ///
    /// Stays pending while there is no open transport, so it can sit in a
    /// `select!` unconditionally.
    pub async fn recv(&mut self) -> TransportResult<Option<ServerMessage>> {
        match self.transport.as_mut() {
            Some(transport) if self.phase.is_open() => transport.recv().await,
            _ => std::future::pending().await,
        }
    }

    /// Dispatch one inbound message.
    pub fn handle_message(&mut self, msg: ServerMessage) {
        self.last_activity = Instant::now();
        match msg {
            ServerMessage::AuthOk { handle } => {
                if self.phase != Phase::Open {
                    tracing::debug!(phase = %self.phase, "ignoring auth_ok");
                    return;
                }
                tracing::info!(handle = %handle, "realtime channel authenticated");
                self.phase = Phase::Authenticated;
                self.reconnect_delay = self.config.initial_reconnect_delay();
                self.handle = Some(handle.clone());
                self.events.push(SyncEvent::RealtimeAuthenticated { handle });
            }
            ServerMessage::Pong => {}
            ServerMessage::Error { code, message } => {
                tracing::warn!(code = %code, "realtime error: {}", message);
                self.events.push(SyncEvent::ServerError { code, message });
            }
            ServerMessage::Ack { kind, .. } => {
                tracing::debug!(kind = %kind, "acknowledged");
            }
            ServerMessage::Unknown { kind } => {
                tracing::debug!(kind = %kind, "ignoring unknown message type");
            }
            data if self.phase != Phase::Authenticated => {
                tracing::debug!(kind = %data.kind(), "dropping message before authentication");
            }
            ServerMessage::FileChanged(change) => {
                self.events.push(SyncEvent::FileChanged(change));
            }
            ServerMessage::FileDeleted { path } => {
                self.events.push(SyncEvent::FileDeleted { path });
            }
            ServerMessage::SyncData { files } => {
                self.events.push(SyncEvent::FullSync { files });
            }
            ServerMessage::VersionsData(history) => {
                self.events.push(SyncEvent::VersionHistory(history));
            }
            ServerMessage::VersionRestored {
                path,
                restored_version,
            } => {
                self.events.push(SyncEvent::VersionRestored {
                    path,
                    version: restored_version,
                });
            }
            ServerMessage::SceneEcho { kind, payload } => {
                self.events.push(SyncEvent::SceneEcho { kind, payload });
            }
        }
    }

    /// Handle the transport closing or failing underneath the channel.
    pub async fn handle_closed(&mut self) {
        let was_open = self.phase.is_open();
        self.phase = Phase::Closing;
        if let Some(mut transport) = self.transport.take() {
            let _ = transport.disconnect().await;
        }
        self.phase = Phase::Disconnected;
        self.handle = None;
        if was_open {
            tracing::info!("realtime channel closed");
            self.events.push(SyncEvent::RealtimeDisconnected);
        }
        self.schedule_reconnect();
    }

    /// Close the channel and cancel any scheduled reconnect.
    ///
    /// Safe to call in any phase; an in-flight connect attempt is abandoned.
    pub async fn disconnect(&mut self) {
        self.reconnect_at = None;
        if self.phase == Phase::Disconnected && self.transport.is_none() {
            return;
        }
        let was_open = self.phase.is_open();
        // Invalidate any attempt still in flight
        self.attempt += 1;
        self.phase = Phase::Closing;
        if let Some(mut transport) = self.transport.take() {
            let _ = transport.disconnect().await;
        }
        self.phase = Phase::Disconnected;
        self.handle = None;
        if was_open {
            tracing::info!("realtime channel disconnected");
            self.events.push(SyncEvent::RealtimeDisconnected);
        }
    }

    /// Send a message on an authenticated channel.
    pub async fn send(&mut self, msg: ClientMessage) -> Result<(), ChannelError> {
        match self.phase {
            Phase::Authenticated => {}
            Phase::Open => return Err(ChannelError::NotAuthenticated),
            _ => return Err(ChannelError::NotConnected),
        }
        if let Err(e) = self.send_raw(msg).await {
            self.handle_closed().await;
            return Err(e);
        }
        Ok(())
    }

    /// When the next keepalive is due, if authenticated.
    pub fn keepalive_at(&self) -> Option<Instant> {
        (self.phase == Phase::Authenticated)
            .then(|| self.last_activity + self.config.keepalive_interval())
    }

    /// Send a keepalive ping. Missing pongs are not tracked.
    pub async fn send_keepalive(&mut self) {
        if self.phase != Phase::Authenticated {
            return;
        }
        tracing::debug!("sending keepalive");
        if let Err(e) = self.send_raw(ClientMessage::ping()).await {
            tracing::debug!("keepalive failed: {}", e);
            self.handle_closed().await;
        }
    }

    async fn send_raw(&mut self, msg: ClientMessage) -> Result<(), ChannelError> {
        let transport = self.transport.as_mut().ok_or(ChannelError::NotConnected)?;
        transport.send(msg).await?;
        self.last_activity = Instant::now();
        Ok(())
    }

    fn schedule_reconnect(&mut self) {
        let delay = self.reconnect_delay;
        self.reconnect_at = Some(Instant::now() + delay);
        self.reconnect_delay = (delay * 2).min(self.config.max_reconnect_delay());
        tracing::debug!(delay_ms = delay.as_millis() as u64, "realtime reconnect scheduled");
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
