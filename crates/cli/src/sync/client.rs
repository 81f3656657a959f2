// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync operations facade and its event loop.
//!
//! `SyncClient` owns every piece of sync state (session, connectivity,
//! request gate, realtime channel) and mutates it from one task only.
//! Transport calls run as spawned tasks whose results come back as
//! [`Completion`]s on an internal channel, so no operation ever blocks the
//! loop waiting for the network.
//!
//! Other tasks talk to a running client through a [`SyncHandle`].

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use netsync_core::{ClientMessage, FileChange, Session};

use super::api;
use super::channel::{Phase, RealtimeChannel, TransportFactory};
use super::events::{reason, EventSink, SyncEvent};
use super::gate::{RequestGate, RequestKind};
use super::http::{HttpError, HttpRequest, HttpResponse, HttpResult, HttpTransport, ReqwestTransport};
use super::supervisor::{ConnectionState, ConnectivitySupervisor, Transition};
use super::transport::{Transport, TransportError, TransportResult, WebSocketTransport};
use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::error::{Error, Result};

/// Capacity of the command queue behind a [`SyncHandle`].
const COMMAND_BUFFER: usize = 64;

/// Path an operation took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Realtime,
    Fallback,
}

/// Why an operation was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Offline,
    NotAuthenticated,
    RealtimeUnavailable,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Offline => reason::OFFLINE,
            SkipReason::NotAuthenticated => reason::NOT_AUTHENTICATED,
            SkipReason::RealtimeUnavailable => reason::REALTIME_UNAVAILABLE,
        }
    }
}

/// Immediate result of invoking an operation.
///
/// Fallback calls resolve later through a [`SyncEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    /// The call was issued on the given route.
    Sent(Route),
    /// The operation finished synchronously.
    Completed,
    /// Preconditions were unmet; nothing was issued.
    Skipped(SkipReason),
    /// Another request/reply call is in flight.
    Busy,
}

impl OpOutcome {
    /// Whether anything was issued or done.
    pub fn is_accepted(&self) -> bool {
        matches!(self, OpOutcome::Sent(_) | OpOutcome::Completed)
    }

    /// Reason code for a rejected operation.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            OpOutcome::Skipped(why) => Some(why.as_str()),
            OpOutcome::Busy => Some(reason::REQUEST_IN_PROGRESS),
            _ => None,
        }
    }
}

/// What a request/reply call was for, carried to its completion.
#[derive(Debug, Clone, PartialEq)]
enum PendingCall {
    Register { email: Option<String> },
    Recover,
    CheckHandle(String),
    CheckContact(String),
    Mutation { kind: RequestKind, path: String },
    PushFilesystem,
    FetchFilesystem,
    FetchVersions(String),
    RestoreVersion { path: String, version: u64 },
}

impl PendingCall {
    fn kind(&self) -> RequestKind {
        match self {
            PendingCall::Register { .. } => RequestKind::Register,
            PendingCall::Recover => RequestKind::Recover,
            PendingCall::CheckHandle(_) => RequestKind::CheckHandle,
            PendingCall::CheckContact(_) => RequestKind::CheckContact,
            PendingCall::Mutation { kind, .. } => *kind,
            PendingCall::PushFilesystem => RequestKind::PushFilesystem,
            PendingCall::FetchFilesystem => RequestKind::FetchFilesystem,
            PendingCall::FetchVersions(_) => RequestKind::FetchVersions,
            PendingCall::RestoreVersion { .. } => RequestKind::RestoreVersion,
        }
    }
}

/// Results delivered back to the loop by spawned tasks.
enum Completion<T> {
    Probe(bool),
    Request {
        call: PendingCall,
        result: HttpResult<HttpResponse>,
    },
    Connected {
        attempt: u64,
        result: TransportResult<T>,
    },
}

/// Delivers a fallback completion if the task ends without reporting,
/// so the gate and the probe marker are always released.
struct CompletionGuard<T> {
    tx: mpsc::UnboundedSender<Completion<T>>,
    fallback: Option<Completion<T>>,
}

impl<T> CompletionGuard<T> {
    fn new(tx: mpsc::UnboundedSender<Completion<T>>, fallback: Completion<T>) -> Self {
        CompletionGuard {
            tx,
            fallback: Some(fallback),
        }
    }

    fn complete(mut self, completion: Completion<T>) {
        self.fallback = None;
        let _ = self.tx.send(completion);
    }
}

impl<T> Drop for CompletionGuard<T> {
    fn drop(&mut self) {
        if let Some(completion) = self.fallback.take() {
            let _ = self.tx.send(completion);
        }
    }
}

/// An operation a [`SyncHandle`] can submit.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CheckNow,
    Register {
        handle: String,
        email: Option<String>,
    },
    Recover {
        recovery_code: String,
    },
    CheckHandle {
        handle: String,
    },
    CheckContact {
        contact: String,
    },
    WriteFile(FileChange),
    DeleteFile {
        path: String,
    },
    CreateDirectory {
        path: String,
    },
    RemoveDirectory {
        path: String,
    },
    RequestFullSync {
        since: Option<String>,
    },
    FetchVersions {
        path: String,
    },
    RestoreVersion {
        path: String,
        version: u64,
    },
    PushFilesystem {
        filesystem: Value,
    },
    FetchFilesystem,
    Logout,
}

/// Point-in-time view of the client for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientStatus {
    pub online: bool,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub handle: String,
    pub realtime: String,
    pub consecutive_failures: u32,
    pub retry_interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_request: Option<RequestKind>,
}

enum Command {
    Run {
        op: Operation,
        reply: oneshot::Sender<OpOutcome>,
    },
    Status {
        reply: oneshot::Sender<ClientStatus>,
    },
}

/// Cloneable handle to a running [`SyncClient`].
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<Command>,
}

impl SyncHandle {
    /// Submit an operation and wait for its immediate outcome.
    pub async fn submit(&self, op: Operation) -> Result<OpOutcome> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Run { op, reply })
            .await
            .map_err(|_| Error::ClientStopped)?;
        rx.await.map_err(|_| Error::ClientStopped)
    }

    pub async fn status(&self) -> Result<ClientStatus> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Status { reply })
            .await
            .map_err(|_| Error::ClientStopped)?;
        rx.await.map_err(|_| Error::ClientStopped)
    }

    pub async fn check_now(&self) -> Result<OpOutcome> {
        self.submit(Operation::CheckNow).await
    }

    pub async fn write_file(&self, change: FileChange) -> Result<OpOutcome> {
        self.submit(Operation::WriteFile(change)).await
    }

    pub async fn delete_file(&self, path: impl Into<String>) -> Result<OpOutcome> {
        self.submit(Operation::DeleteFile { path: path.into() }).await
    }
}

/// The sync client.
pub struct SyncClient<T: Transport = WebSocketTransport> {
    config: ClientConfig,
    session: Session,
    client_id: String,
    credentials: Box<dyn CredentialStore>,
    events: Box<dyn EventSink>,
    http: Arc<dyn HttpTransport>,
    supervisor: ConnectivitySupervisor,
    gate: RequestGate,
    channel: RealtimeChannel<T>,
    completions_tx: mpsc::UnboundedSender<Completion<T>>,
    completions_rx: mpsc::UnboundedReceiver<Completion<T>>,
    next_probe_at: Option<Instant>,
}

impl SyncClient<WebSocketTransport> {
    /// Create a client using reqwest and tokio-tungstenite.
    pub fn new(
        config: ClientConfig,
        credentials: Box<dyn CredentialStore>,
        events: Box<dyn EventSink>,
    ) -> Result<Self> {
        let http = ReqwestTransport::new(config.base_url(), config.request_timeout())?;
        Self::with_transports(
            config,
            credentials,
            events,
            Arc::new(http),
            Arc::new(WebSocketTransport::new),
        )
    }
}

impl<T: Transport + 'static> SyncClient<T> {
    /// Create a client with injected transports.
    ///
    /// Loads the cached session and client id from `credentials`.
    pub fn with_transports(
        config: ClientConfig,
        credentials: Box<dyn CredentialStore>,
        events: Box<dyn EventSink>,
        http: Arc<dyn HttpTransport>,
        factory: TransportFactory<T>,
    ) -> Result<Self> {
        let session = credentials.load_session();
        let client_id = credentials.client_id()?;
        let channel = RealtimeChannel::new(config.realtime_url(), config.realtime.clone(), factory);
        let supervisor = ConnectivitySupervisor::new(config.supervisor.clone());
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        tracing::debug!(
            authenticated = session.is_authenticated(),
            "sync client created"
        );
        Ok(SyncClient {
            config,
            session,
            client_id,
            credentials,
            events,
            http,
            supervisor,
            gate: RequestGate::new(),
            channel,
            completions_tx,
            completions_rx,
            next_probe_at: None,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_online(&self) -> bool {
        self.supervisor.is_online()
    }

    /// Whether a session token is present.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    pub fn realtime_phase(&self) -> Phase {
        self.channel.phase()
    }

    pub fn status(&self) -> ClientStatus {
        let state = self.supervisor.state();
        ClientStatus {
            online: state.is_online,
            authenticated: self.session.is_authenticated(),
            handle: self.session.handle.clone(),
            realtime: self.channel.phase().to_string(),
            consecutive_failures: state.consecutive_failures,
            retry_interval_secs: state.current_retry_interval.as_secs(),
            pending_request: self.gate.pending().map(|p| p.kind),
        }
    }

    /// Start a reachability probe unless one is already in flight.
    pub fn check_now(&mut self) -> bool {
        if !self.supervisor.begin_probe() {
            return false;
        }
        self.next_probe_at = None;
        let http = Arc::clone(&self.http);
        let guard = CompletionGuard::new(self.completions_tx.clone(), Completion::Probe(false));
        tokio::spawn(async move {
            let success = matches!(http.send(api::status()).await, Ok(ref r) if r.is_ok());
            guard.complete(Completion::Probe(success));
        });
        true
    }

    /// Register a new identity.
    pub async fn register(&mut self, handle: &str, email: Option<&str>) -> OpOutcome {
        if !self.supervisor.is_online() {
            self.emit(SyncEvent::RegistrationFailed {
                reason: reason::OFFLINE.to_string(),
            });
            return OpOutcome::Skipped(SkipReason::Offline);
        }
        let request = api::register(handle, email, &self.client_id);
        let call = PendingCall::Register {
            email: email.map(str::to_string),
        };
        self.issue(call, request)
    }

    /// Recover an identity from its recovery code.
    pub async fn recover(&mut self, recovery_code: &str) -> OpOutcome {
        if !self.supervisor.is_online() {
            self.emit(SyncEvent::RecoveryFailed {
                reason: reason::OFFLINE.to_string(),
            });
            return OpOutcome::Skipped(SkipReason::Offline);
        }
        let request = api::recover(recovery_code, &self.client_id);
        self.issue(PendingCall::Recover, request)
    }

    pub async fn check_handle(&mut self, handle: &str) -> OpOutcome {
        if !self.supervisor.is_online() {
            return OpOutcome::Skipped(SkipReason::Offline);
        }
        self.issue(PendingCall::CheckHandle(handle.to_string()), api::player(handle))
    }

    pub async fn check_contact(&mut self, contact: &str) -> OpOutcome {
        if !self.supervisor.is_online() {
            return OpOutcome::Skipped(SkipReason::Offline);
        }
        self.issue(PendingCall::CheckContact(contact.to_string()), api::email(contact))
    }

    /// Create or update a file.
    pub async fn write_file(&mut self, change: FileChange) -> OpOutcome {
        let path = change.path.clone();
        let message = ClientMessage::file_change(change.clone());
        self.mutate(RequestKind::WriteFile, path, message, move |token| {
            api::write_file(token, &change)
        })
        .await
    }

    pub async fn delete_file(&mut self, path: &str) -> OpOutcome {
        let message = ClientMessage::file_delete(path);
        let owned = path.to_string();
        self.mutate(RequestKind::DeleteFile, owned.clone(), message, move |token| {
            api::delete_file(token, &owned)
        })
        .await
    }

    pub async fn create_directory(&mut self, path: &str) -> OpOutcome {
        let message = ClientMessage::mkdir(path);
        let owned = path.to_string();
        self.mutate(RequestKind::CreateDirectory, owned.clone(), message, move |token| {
            api::create_directory(token, &owned)
        })
        .await
    }

    pub async fn remove_directory(&mut self, path: &str) -> OpOutcome {
        let message = ClientMessage::rmdir(path);
        let owned = path.to_string();
        self.mutate(RequestKind::RemoveDirectory, owned.clone(), message, move |token| {
            api::remove_directory(token, &owned)
        })
        .await
    }

    /// Ask for a full snapshot over the realtime channel. There is no
    /// fallback for this call.
    pub async fn request_full_sync(&mut self, since: Option<String>) -> OpOutcome {
        if !self.channel.is_authenticated() {
            return OpOutcome::Skipped(SkipReason::RealtimeUnavailable);
        }
        match self.channel.send(ClientMessage::request_sync(since)).await {
            Ok(()) => OpOutcome::Sent(Route::Realtime),
            Err(e) => {
                tracing::debug!("request_sync failed: {}", e);
                OpOutcome::Skipped(SkipReason::RealtimeUnavailable)
            }
        }
    }

    pub async fn fetch_versions(&mut self, path: &str) -> OpOutcome {
        let call = PendingCall::FetchVersions(path.to_string());
        self.fallback(call, |token| api::versions(token, path))
    }

    pub async fn restore_version(&mut self, path: &str, version: u64) -> OpOutcome {
        let call = PendingCall::RestoreVersion {
            path: path.to_string(),
            version,
        };
        self.fallback(call, |token| api::restore(token, path, version))
    }

    /// Replace the whole remote filesystem.
    pub async fn push_filesystem(&mut self, filesystem: Value) -> OpOutcome {
        self.fallback(PendingCall::PushFilesystem, move |token| {
            api::put_filesystem(token, filesystem)
        })
    }

    pub async fn fetch_filesystem(&mut self) -> OpOutcome {
        self.fallback(PendingCall::FetchFilesystem, api::get_filesystem)
    }

    /// Clear the session everywhere and close the realtime channel.
    pub async fn logout(&mut self) -> OpOutcome {
        self.session.clear();
        if let Err(e) = self.credentials.save_session(&self.session) {
            tracing::warn!("failed to persist cleared session: {}", e);
        }
        self.channel.disconnect().await;
        self.flush_channel_events();
        self.emit(SyncEvent::LoggedOut);
        OpOutcome::Completed
    }

    /// Run one operation.
    pub async fn dispatch(&mut self, op: Operation) -> OpOutcome {
        tracing::debug!("dispatching {:?}", op);
        let outcome = match op {
            Operation::CheckNow => {
                if self.check_now() {
                    OpOutcome::Sent(Route::Fallback)
                } else {
                    OpOutcome::Busy
                }
            }
            Operation::Register { handle, email } => self.register(&handle, email.as_deref()).await,
            Operation::Recover { recovery_code } => self.recover(&recovery_code).await,
            Operation::CheckHandle { handle } => self.check_handle(&handle).await,
            Operation::CheckContact { contact } => self.check_contact(&contact).await,
            Operation::WriteFile(change) => self.write_file(change).await,
            Operation::DeleteFile { path } => self.delete_file(&path).await,
            Operation::CreateDirectory { path } => self.create_directory(&path).await,
            Operation::RemoveDirectory { path } => self.remove_directory(&path).await,
            Operation::RequestFullSync { since } => self.request_full_sync(since).await,
            Operation::FetchVersions { path } => self.fetch_versions(&path).await,
            Operation::RestoreVersion { path, version } => {
                self.restore_version(&path, version).await
            }
            Operation::PushFilesystem { filesystem } => self.push_filesystem(filesystem).await,
            Operation::FetchFilesystem => self.fetch_filesystem().await,
            Operation::Logout => self.logout().await,
        };
        self.flush_channel_events();
        outcome
    }

    /// Spawn the event loop, returning a handle to it.
    pub fn spawn(self, cancel: CancellationToken) -> (SyncHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(self.run(rx, cancel));
        (SyncHandle { tx }, task)
    }

    /// Drive the client until `cancel` fires or every handle is dropped.
    async fn run(mut self, mut commands: mpsc::Receiver<Command>, cancel: CancellationToken) {
        self.check_now();

        loop {
            let probe_at = self.next_probe_at;
            let reconnect_at = self.channel.reconnect_at();
            let keepalive_at = self.channel.keepalive_at();

            tokio::select! {
                _ = cancel.cancelled() => break,

                cmd = commands.recv() => match cmd {
                    Some(Command::Run { op, reply }) => {
                        let outcome = self.dispatch(op).await;
                        let _ = reply.send(outcome);
                    }
                    Some(Command::Status { reply }) => {
                        let _ = reply.send(self.status());
                    }
                    None => break,
                },

                Some(completion) = self.completions_rx.recv() => {
                    self.handle_completion(completion).await;
                }

                result = self.channel.recv() => {
                    self.handle_inbound(result).await;
                }

                _ = sleep_until(probe_at), if probe_at.is_some() => {
                    self.check_now();
                }

                _ = sleep_until(reconnect_at), if reconnect_at.is_some() => {
                    self.on_reconnect_due();
                }

                _ = sleep_until(keepalive_at), if keepalive_at.is_some() => {
                    self.channel.send_keepalive().await;
                }
            }

            self.flush_channel_events();
        }

        self.channel.disconnect().await;
        self.flush_channel_events();
        tracing::debug!("sync client stopped");
    }

    async fn mutate(
        &mut self,
        kind: RequestKind,
        path: String,
        message: ClientMessage,
        build: impl FnOnce(&str) -> HttpRequest,
    ) -> OpOutcome {
        if self.channel.is_authenticated() {
            match self.channel.send(message).await {
                Ok(()) => return OpOutcome::Sent(Route::Realtime),
                Err(e) => tracing::debug!("{} over realtime failed, falling back: {}", kind, e),
            }
        }
        self.fallback(PendingCall::Mutation { kind, path }, build)
    }

    /// Issue a request/reply call that needs identity.
    fn fallback(&mut self, call: PendingCall, build: impl FnOnce(&str) -> HttpRequest) -> OpOutcome {
        let request = match self.session.token() {
            Some(token) => build(token),
            None => {
                tracing::debug!("{} skipped: no session token", call.kind());
                return OpOutcome::Skipped(SkipReason::NotAuthenticated);
            }
        };
        if !self.supervisor.is_online() {
            tracing::debug!("{} skipped: offline", call.kind());
            return OpOutcome::Skipped(SkipReason::Offline);
        }
        self.issue(call, request)
    }

    /// Acquire the gate and spawn the call.
    fn issue(&mut self, call: PendingCall, request: HttpRequest) -> OpOutcome {
        if !self.gate.try_acquire(call.kind()) {
            return OpOutcome::Busy;
        }
        let http = Arc::clone(&self.http);
        let guard = CompletionGuard::new(
            self.completions_tx.clone(),
            Completion::Request {
                call: call.clone(),
                result: Err(HttpError::Aborted),
            },
        );
        tokio::spawn(async move {
            let result = http.send(request).await;
            guard.complete(Completion::Request { call, result });
        });
        OpOutcome::Sent(Route::Fallback)
    }

    async fn handle_completion(&mut self, completion: Completion<T>) {
        match completion {
            Completion::Probe(success) => self.on_probe(success).await,
            Completion::Request { call, result } => {
                self.gate.release();
                self.on_response(call, result).await;
            }
            Completion::Connected { attempt, result } => {
                let token = self.session.session_token.clone();
                self.channel.on_connected(attempt, result, &token).await;
            }
        }
        self.flush_channel_events();
    }

    async fn on_probe(&mut self, success: bool) {
        let transition = self.supervisor.report_outcome(success);
        let interval = self.supervisor.retry_interval();
        self.next_probe_at = Some(Instant::now() + interval);

        match transition {
            Some(Transition::Online) => {
                tracing::info!("backend reachable");
                self.emit(SyncEvent::ConnectivityChanged { online: true });
                self.maybe_connect();
            }
            Some(Transition::Offline) => {
                tracing::info!("backend unreachable, retrying in {:?}", interval);
                self.emit(SyncEvent::ConnectivityChanged { online: false });
                self.channel.disconnect().await;
            }
            None if !success => {
                tracing::debug!("probe failed, retrying in {:?}", interval);
            }
            None => {}
        }
    }

    async fn on_response(&mut self, call: PendingCall, result: HttpResult<HttpResponse>) {
        let kind = call.kind();
        if let Err(ref e) = result {
            tracing::warn!("{} failed: {}", kind, e);
        }

        match call {
            PendingCall::Register { .. } | PendingCall::Recover => {
                let (registering, requested_email) = match call {
                    PendingCall::Register { email } => (true, email),
                    _ => (false, None),
                };
                match api::interpret_account(&result) {
                    Ok((account, payload)) => {
                        self.establish(account, requested_email).await;
                        self.emit(if registering {
                            SyncEvent::Registered { payload }
                        } else {
                            SyncEvent::Recovered { payload }
                        });
                        self.maybe_connect();
                    }
                    Err(reason) => {
                        tracing::warn!("{} rejected: {}", kind, reason);
                        self.emit(if registering {
                            SyncEvent::RegistrationFailed { reason }
                        } else {
                            SyncEvent::RecoveryFailed { reason }
                        });
                    }
                }
            }
            PendingCall::CheckHandle(handle) => {
                let (available, reason) = api::interpret_availability(&result);
                self.emit(SyncEvent::HandleAvailability {
                    handle,
                    available,
                    reason,
                });
            }
            PendingCall::CheckContact(contact) => {
                let (available, reason) = api::interpret_availability(&result);
                self.emit(SyncEvent::ContactAvailability {
                    contact,
                    available,
                    reason,
                });
            }
            PendingCall::Mutation { kind, path } => match api::interpret_ack(&result) {
                Ok(()) => self.emit(SyncEvent::MutationApplied { kind, path }),
                Err(reason) => {
                    tracing::warn!("{} {} rejected: {}", kind, path, reason);
                    self.emit(SyncEvent::MutationFailed { kind, path, reason });
                }
            },
            PendingCall::PushFilesystem => match api::interpret_ack(&result) {
                Ok(()) => self.emit(SyncEvent::FilesystemPushed),
                Err(reason) => self.emit(SyncEvent::FilesystemSyncFailed { reason }),
            },
            PendingCall::FetchFilesystem => match api::interpret_filesystem(&result) {
                Ok(filesystem) => self.emit(SyncEvent::FilesystemFetched { filesystem }),
                Err(reason) => self.emit(SyncEvent::FilesystemSyncFailed { reason }),
            },
            PendingCall::FetchVersions(path) => match api::interpret_versions(&result, &path) {
                Ok(history) => self.emit(SyncEvent::VersionHistory(history)),
                Err(reason) => self.emit(SyncEvent::VersionHistoryFailed { path, reason }),
            },
            PendingCall::RestoreVersion { path, version } => match api::interpret_ack(&result) {
                Ok(()) => self.emit(SyncEvent::VersionRestored { path, version }),
                Err(reason) => self.emit(SyncEvent::RestoreFailed {
                    path,
                    version,
                    reason,
                }),
            },
        }
    }

    /// Adopt backend-issued credentials, replacing the whole session.
    ///
    /// The backend may omit the email; the one supplied at registration
    /// is kept in that case.
    async fn establish(&mut self, account: api::AccountResponse, requested_email: Option<String>) {
        let contact_id = match account.email {
            email if email.is_empty() => requested_email.unwrap_or_default(),
            email => email,
        };
        self.session.replace(Session::established(
            account.handle,
            contact_id,
            account.recovery_code,
            account.session_token,
        ));
        if let Err(e) = self.credentials.save_session(&self.session) {
            tracing::warn!("failed to persist session: {}", e);
        }
        tracing::info!(handle = %self.session.handle, "session established");
        // Any open channel was authenticated with the previous token
        self.channel.disconnect().await;
        self.flush_channel_events();
    }

    async fn handle_inbound(&mut self, result: TransportResult<Option<netsync_core::ServerMessage>>) {
        match result {
            Ok(Some(msg)) => self.channel.handle_message(msg),
            Ok(None) => self.channel.handle_closed().await,
            Err(e) => {
                tracing::debug!("realtime receive failed: {}", e);
                self.channel.handle_closed().await;
            }
        }
    }

    fn on_reconnect_due(&mut self) {
        if self.supervisor.is_online() && self.session.is_authenticated() {
            self.maybe_connect();
        } else {
            self.channel.cancel_reconnect();
        }
    }

    /// Start a connect attempt if online with a token and disconnected.
    fn maybe_connect(&mut self) {
        if !self.supervisor.is_online() || !self.session.is_authenticated() {
            return;
        }
        if let Some(connect) = self.channel.start_connect() {
            let attempt = self.channel.attempt();
            let limit = self.config.request_timeout();
            let guard = CompletionGuard::new(
                self.completions_tx.clone(),
                Completion::Connected {
                    attempt,
                    result: Err(TransportError::Connect("connect task aborted".into())),
                },
            );
            tokio::spawn(async move {
                let completion = match tokio::time::timeout(limit, connect).await {
                    Ok((attempt, result)) => Completion::Connected { attempt, result },
                    Err(_) => Completion::Connected {
                        attempt,
                        result: Err(TransportError::Connect(format!(
                            "timed out after {:?}",
                            limit
                        ))),
                    },
                };
                guard.complete(completion);
            });
        }
    }

    fn flush_channel_events(&mut self) {
        for event in self.channel.take_events() {
            self.events.emit(event);
        }
    }

    fn emit(&self, event: SyncEvent) {
        tracing::debug!(event = event.name(), "emit");
        self.events.emit(event);
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
