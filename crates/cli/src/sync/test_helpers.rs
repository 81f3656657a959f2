// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::{mpsc, Semaphore};

use netsync_core::{ClientMessage, ServerMessage};

use super::events::{EventSink, SyncEvent};
use super::http::{HttpError, HttpRequest, HttpResponse, HttpResult, HttpTransport};
use super::transport::{Transport, TransportError, TransportResult};

/// Mock request/reply transport recording every request and replaying
/// scripted responses.
///
/// With no scripted response left, answers 200 with an empty JSON object.
/// After [`MockHttp::hold`], calls stay in flight until [`MockHttp::release_held`].
#[derive(Clone)]
pub struct MockHttp {
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    responses: Arc<Mutex<VecDeque<HttpResult<HttpResponse>>>>,
    holding: Arc<AtomicBool>,
    held: Arc<Semaphore>,
}

impl Default for MockHttp {
    fn default() -> Self {
        MockHttp {
            requests: Arc::default(),
            responses: Arc::default(),
            holding: Arc::default(),
            held: Arc::new(Semaphore::new(0)),
        }
    }
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep subsequent calls in flight.
    pub fn hold(&self) {
        self.holding.store(true, Ordering::SeqCst);
    }

    /// Let every held call complete.
    pub fn release_held(&self) {
        self.holding.store(false, Ordering::SeqCst);
        self.held.add_permits(1024);
    }

    /// Queue a response for the next call.
    pub fn respond(&self, status: u16, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body.to_string())));
    }

    /// Queue a raw (possibly non-JSON) body for the next call.
    pub fn respond_raw(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body)));
    }

    /// Queue a transport failure for the next call.
    pub fn fail(&self, error: HttpError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get all requests that were sent.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Paths of all requests that were sent.
    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

impl HttpTransport for MockHttp {
    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = HttpResult<HttpResponse>> + Send + '_>> {
        let requests = Arc::clone(&self.requests);
        let responses = Arc::clone(&self.responses);
        let held = Arc::clone(&self.held);
        let holding = self.holding.load(Ordering::SeqCst);
        Box::pin(async move {
            requests.lock().unwrap().push(request);
            if holding {
                let _permit = held.acquire().await.map_err(|_| HttpError::Aborted)?;
            }
            responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::new(200, "{}")))
        })
    }
}

/// Scripted outcome of one connect attempt.
#[derive(Clone, Copy, PartialEq)]
enum ConnectScript {
    Fail,
    Stall,
}

#[derive(Default)]
struct ServerState {
    /// Scripted connect outcomes; empty means success.
    connect_results: VecDeque<ConnectScript>,
    connects: usize,
    sent: Vec<ClientMessage>,
    /// Inbound queue of the most recent successful connection.
    inbound: Option<mpsc::UnboundedSender<Option<ServerMessage>>>,
}

/// Scripted realtime peer shared by every [`MockTransport`] it creates.
#[derive(Clone, Default)]
pub struct MockServer {
    state: Arc<Mutex<ServerState>>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh transport bound to this server.
    pub fn transport(&self) -> MockTransport {
        let (tx, rx) = mpsc::unbounded_channel();
        MockTransport {
            server: self.clone(),
            tx,
            rx,
            connected: false,
        }
    }

    /// Make the next connect attempt fail.
    pub fn fail_next_connect(&self) {
        self.state
            .lock()
            .unwrap()
            .connect_results
            .push_back(ConnectScript::Fail);
    }

    /// Make the next connect attempt never complete.
    pub fn stall_next_connect(&self) {
        self.state
            .lock()
            .unwrap()
            .connect_results
            .push_back(ConnectScript::Stall);
    }

    /// Deliver a message on the current connection.
    pub fn push(&self, msg: ServerMessage) {
        if let Some(tx) = self.state.lock().unwrap().inbound.as_ref() {
            let _ = tx.send(Some(msg));
        }
    }

    /// Close the current connection from the server side.
    pub fn close(&self) {
        if let Some(tx) = self.state.lock().unwrap().inbound.take() {
            let _ = tx.send(None);
        }
    }

    /// Number of connect attempts so far.
    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    /// Messages sent by the client, across all connections.
    pub fn sent(&self) -> Vec<ClientMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Message kinds sent by the client.
    pub fn sent_kinds(&self) -> Vec<&'static str> {
        self.sent().iter().map(|m| m.kind()).collect()
    }
}

/// Mock transport for testing without real sockets.
pub struct MockTransport {
    server: MockServer,
    tx: mpsc::UnboundedSender<Option<ServerMessage>>,
    rx: mpsc::UnboundedReceiver<Option<ServerMessage>>,
    connected: bool,
}

impl Transport for MockTransport {
    fn connect(
        &mut self,
        _url: &str,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            let script = {
                let mut state = self.server.state.lock().unwrap();
                state.connects += 1;
                state.connect_results.pop_front()
            };
            match script {
                Some(ConnectScript::Fail) => {
                    return Err(TransportError::Connect("mock failure".into()))
                }
                Some(ConnectScript::Stall) => std::future::pending::<()>().await,
                None => {}
            }
            self.server.state.lock().unwrap().inbound = Some(self.tx.clone());
            self.connected = true;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            self.connected = false;
            Ok(())
        })
    }

    fn send(
        &mut self,
        msg: ClientMessage,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            if !self.connected {
                return Err(TransportError::Closed);
            }
            self.server.state.lock().unwrap().sent.push(msg);
            Ok(())
        })
    }

    fn recv(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Option<ServerMessage>>> + Send + '_>> {
        Box::pin(async move {
            match self.rx.recv().await {
                Some(Some(msg)) => Ok(Some(msg)),
                _ => {
                    self.connected = false;
                    Ok(None)
                }
            }
        })
    }
}

/// Event sink recording every event in order.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SyncEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.name()).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: SyncEvent) {
        self.events.lock().unwrap().push(event);
    }
}
