// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Socket layer under the realtime channel.
//!
//! [`Transport`] moves typed protocol messages over one connection; the
//! channel owns lifecycle and authentication. [`WebSocketTransport`] is the
//! production implementation, tests substitute a scripted peer.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use netsync_core::{ClientMessage, ServerMessage};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("cannot reach realtime endpoint: {0}")]
    Connect(String),

    #[error("realtime socket is closed")]
    Closed,

    #[error("realtime socket error: {0}")]
    Socket(String),

    #[error("cannot encode {kind} message: {source}")]
    Encode {
        kind: &'static str,
        source: serde_json::Error,
    },
}

pub type TransportResult<T> = Result<T, TransportError>;

/// A bidirectional message connection to the realtime endpoint.
pub trait Transport: Send + Sync {
    fn connect(
        &mut self,
        url: &str,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Close the connection. Closing an unconnected transport is a no-op.
    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    fn send(
        &mut self,
        msg: ClientMessage,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Next decodable server message, or `None` once the peer has closed.
    /// Frames that do not decode are skipped.
    fn recv(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Option<ServerMessage>>> + Send + '_>>;
}

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Socket {
    outbound: SplitSink<Stream, Message>,
    inbound: SplitStream<Stream>,
}

/// Realtime transport over tokio-tungstenite.
#[derive(Default)]
pub struct WebSocketTransport {
    socket: Option<Socket>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn socket(&mut self) -> TransportResult<&mut Socket> {
        self.socket.as_mut().ok_or(TransportError::Closed)
    }
}

impl Transport for WebSocketTransport {
    fn connect(
        &mut self,
        url: &str,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        let url = url.to_string();
        Box::pin(async move {
            let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            let (outbound, inbound) = stream.split();
            self.socket = Some(Socket { outbound, inbound });
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            if let Some(mut socket) = self.socket.take() {
                // Close errors mean the peer is already gone
                let _ = socket.outbound.close().await;
            }
            Ok(())
        })
    }

    fn send(
        &mut self,
        msg: ClientMessage,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            let text = msg.to_json().map_err(|source| TransportError::Encode {
                kind: msg.kind(),
                source,
            })?;
            let sent = self.socket()?.outbound.send(Message::Text(text.into())).await;
            sent.map_err(|e| {
                self.socket = None;
                TransportError::Socket(e.to_string())
            })
        })
    }

    fn recv(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Option<ServerMessage>>> + Send + '_>> {
        Box::pin(async move {
            loop {
                let frame = self.socket()?.inbound.next().await;
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => {
                        self.socket = None;
                        return Ok(None);
                    }
                    // Pings are answered by tungstenite itself
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        self.socket = None;
                        return Err(TransportError::Socket(e.to_string()));
                    }
                };
                match ServerMessage::from_json(&text) {
                    Ok(msg) => return Ok(Some(msg)),
                    Err(e) => tracing::debug!("skipping undecodable frame: {}", e),
                }
            }
        })
    }
}
