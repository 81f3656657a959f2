// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the sync operations facade.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use netsync_core::ServerMessage;
use serde_json::json;

use super::*;
use crate::credentials::MemoryCredentialStore;
use crate::sync::test_helpers::{MockHttp, MockServer, MockTransport, RecordingSink};

struct Harness {
    client: SyncClient<MockTransport>,
    http: MockHttp,
    server: MockServer,
    sink: RecordingSink,
    store: MemoryCredentialStore,
}

fn harness() -> Harness {
    harness_with(Session::default())
}

fn harness_with(session: Session) -> Harness {
    harness_from(ClientConfig::default(), session)
}

fn harness_from(config: ClientConfig, session: Session) -> Harness {
    let http = MockHttp::new();
    let server = MockServer::new();
    let sink = RecordingSink::new();
    let store = MemoryCredentialStore::with_session(session);
    let factory_server = server.clone();
    let client = SyncClient::with_transports(
        config,
        Box::new(store.clone()),
        Box::new(sink.clone()),
        Arc::new(http.clone()),
        Arc::new(move || factory_server.transport()),
    )
    .unwrap();
    Harness {
        client,
        http,
        server,
        sink,
        store,
    }
}

/// Process exactly one completion.
async fn settle(client: &mut SyncClient<MockTransport>) {
    let completion = tokio::time::timeout(Duration::from_secs(5), client.completions_rx.recv())
        .await
        .expect("timed out waiting for completion")
        .expect("completion channel closed");
    client.handle_completion(completion).await;
}

/// Process one inbound realtime message.
async fn pump(client: &mut SyncClient<MockTransport>) {
    let result = tokio::time::timeout(Duration::from_secs(5), client.channel.recv())
        .await
        .expect("timed out waiting for realtime message");
    client.handle_inbound(result).await;
    client.flush_channel_events();
}

async fn go_online(h: &mut Harness) {
    assert!(h.client.check_now());
    settle(&mut h.client).await;
    assert!(h.client.is_online());
}

/// Online with a token but no realtime channel.
async fn online_with_token(h: &mut Harness) {
    go_online(h).await;
    h.client.session = Session::established("NEO", "", "RC", "tok");
}

/// Online with a token and an authenticated realtime channel.
async fn authenticated(h: &mut Harness) {
    go_online(h).await;
    // Connect attempt started by the online transition
    settle(&mut h.client).await;
    h.server.push(ServerMessage::auth_ok("NEO"));
    pump(&mut h.client).await;
    assert_eq!(h.client.realtime_phase(), Phase::Authenticated);
    h.sink.clear();
}

fn token_session() -> Session {
    Session::established("NEO", "", "RC", "tok")
}

#[tokio::test]
async fn registration_success_establishes_session_and_connects() {
    let mut h = harness();
    go_online(&mut h).await;
    h.sink.clear();
    let body = json!({"success": true, "handle": "NEO", "session_token": "abc123"});
    h.http.respond(200, body.clone());

    let outcome = h.client.register("NEO", None).await;
    assert_eq!(outcome, OpOutcome::Sent(Route::Fallback));
    settle(&mut h.client).await;

    let session = h.client.session();
    assert!(session.registered);
    assert_eq!(session.handle, "NEO");
    assert_eq!(session.session_token, "abc123");
    assert_eq!(h.store.load_session(), *session);
    assert_eq!(h.sink.events(), vec![SyncEvent::Registered { payload: body }]);
    assert_eq!(h.client.realtime_phase(), Phase::Connecting);

    settle(&mut h.client).await;
    assert_eq!(h.server.connects(), 1);
    assert_eq!(h.server.sent(), vec![ClientMessage::auth("abc123")]);
}

#[tokio::test]
async fn registration_request_carries_client_id() {
    let mut h = harness();
    go_online(&mut h).await;
    h.client.register("NEO", Some("neo@example.com")).await;
    settle(&mut h.client).await;

    let request = h.http.requests().pop().unwrap();
    assert_eq!(request.path, "/register");
    let body = request.body.unwrap();
    assert_eq!(body["browserId"], h.client.client_id());
    assert_eq!(body["email"], "neo@example.com");
}

#[tokio::test]
async fn registration_keeps_requested_email_when_not_echoed() {
    let mut h = harness();
    go_online(&mut h).await;
    h.http.respond(
        200,
        json!({"success": true, "handle": "NEO", "session_token": "abc123"}),
    );

    h.client.register("NEO", Some("neo@example.com")).await;
    settle(&mut h.client).await;

    assert_eq!(h.client.session().contact_id, "neo@example.com");
    assert_eq!(h.store.load_session().contact_id, "neo@example.com");
}

#[tokio::test]
async fn registration_prefers_email_returned_by_backend() {
    let mut h = harness();
    go_online(&mut h).await;
    h.http.respond(
        200,
        json!({"success": true, "handle": "NEO", "email": "one@example.com", "session_token": "abc123"}),
    );

    h.client.register("NEO", Some("neo@example.com")).await;
    settle(&mut h.client).await;

    assert_eq!(h.client.session().contact_id, "one@example.com");
}

#[tokio::test]
async fn registration_offline_reports_offline() {
    let mut h = harness();
    let outcome = h.client.register("NEO", None).await;

    assert_eq!(outcome, OpOutcome::Skipped(SkipReason::Offline));
    assert_eq!(
        h.sink.events(),
        vec![SyncEvent::RegistrationFailed {
            reason: "offline".into()
        }]
    );
    assert!(h.http.requests().is_empty());
}

#[tokio::test]
async fn recovery_offline_reports_offline() {
    let mut h = harness();
    let outcome = h.client.recover("RC-1").await;
    assert_eq!(outcome, OpOutcome::Skipped(SkipReason::Offline));
    assert_eq!(h.sink.names(), vec!["recovery_failed"]);
}

#[tokio::test]
async fn registration_rejection_keeps_session_and_releases_gate() {
    let mut h = harness();
    go_online(&mut h).await;
    h.sink.clear();
    h.http.respond(409, json!({"error": "handle_taken"}));

    h.client.register("NEO", None).await;
    settle(&mut h.client).await;

    assert_eq!(
        h.sink.events(),
        vec![SyncEvent::RegistrationFailed {
            reason: "handle_taken".into()
        }]
    );
    assert!(!h.client.is_authenticated());
    assert!(h.client.gate.pending().is_none());
    assert_eq!(h.store.save_count(), 0);
}

#[tokio::test]
async fn recovery_success_emits_recovered() {
    let mut h = harness();
    go_online(&mut h).await;
    h.sink.clear();
    h.http.respond(
        200,
        json!({"success": true, "handle": "NEO", "session_token": "t2", "recovery_code": "RC-9"}),
    );

    h.client.recover("RC-9").await;
    settle(&mut h.client).await;

    assert_eq!(h.sink.names(), vec!["recovered"]);
    assert_eq!(h.client.session().recovery_code, "RC-9");
    assert_eq!(h.client.session().session_token, "t2");
}

#[tokio::test]
async fn handle_check_not_found_is_available() {
    let mut h = harness();
    go_online(&mut h).await;
    h.sink.clear();
    h.http.respond(404, json!({}));

    h.client.check_handle("NEO").await;
    settle(&mut h.client).await;

    assert_eq!(
        h.sink.events(),
        vec![SyncEvent::HandleAvailability {
            handle: "NEO".into(),
            available: true,
            reason: None
        }]
    );
}

#[tokio::test]
async fn handle_check_found_is_taken() {
    let mut h = harness();
    go_online(&mut h).await;
    h.sink.clear();
    h.http.respond(200, json!({"handle": "NEO"}));

    h.client.check_handle("NEO").await;
    settle(&mut h.client).await;

    assert_eq!(
        h.sink.events(),
        vec![SyncEvent::HandleAvailability {
            handle: "NEO".into(),
            available: false,
            reason: Some("taken".into())
        }]
    );
}

#[tokio::test]
async fn contact_check_uses_email_route() {
    let mut h = harness();
    go_online(&mut h).await;
    h.sink.clear();
    h.http.respond(404, json!({}));

    h.client.check_contact("neo@example.com").await;
    settle(&mut h.client).await;

    assert_eq!(h.http.paths().last().unwrap(), "/email/neo%40example.com");
    assert_eq!(h.sink.names(), vec!["contact_availability"]);
}

#[tokio::test]
async fn availability_checks_require_online() {
    let mut h = harness();
    assert_eq!(
        h.client.check_handle("NEO").await,
        OpOutcome::Skipped(SkipReason::Offline)
    );
    assert_eq!(
        h.client.check_contact("a@b.c").await,
        OpOutcome::Skipped(SkipReason::Offline)
    );
    assert!(h.http.requests().is_empty());
}

#[tokio::test]
async fn restore_rejected_while_versions_pending() {
    let mut h = harness();
    online_with_token(&mut h).await;
    h.http.hold();

    let first = h.client.fetch_versions("notes/a.txt").await;
    assert_eq!(first, OpOutcome::Sent(Route::Fallback));
    let second = h.client.restore_version("notes/a.txt", 1).await;
    assert_eq!(second, OpOutcome::Busy);
    assert_eq!(second.reason(), Some("request_in_progress"));

    h.http.release_held();
    settle(&mut h.client).await;

    assert!(h.http.paths().iter().all(|p| !p.contains("/restore/")));
    assert!(h
        .http
        .paths()
        .contains(&"/versions/tok/notes%2Fa.txt".to_string()));
    assert!(h.client.gate.pending().is_none());
    assert_eq!(
        h.client.restore_version("notes/a.txt", 1).await,
        OpOutcome::Sent(Route::Fallback)
    );
}

#[tokio::test]
async fn mutations_without_token_issue_nothing() {
    let mut h = harness();
    go_online(&mut h).await;
    let before = h.http.requests().len();
    let skipped = OpOutcome::Skipped(SkipReason::NotAuthenticated);

    assert_eq!(
        h.client
            .write_file(FileChange::new("a.txt", "x", "text"))
            .await,
        skipped
    );
    assert_eq!(h.client.delete_file("a.txt").await, skipped);
    assert_eq!(h.client.create_directory("d").await, skipped);
    assert_eq!(h.client.remove_directory("d").await, skipped);
    tokio::task::yield_now().await;

    assert_eq!(h.http.requests().len(), before);
    assert!(h.server.sent().is_empty());
    assert!(h.client.gate.pending().is_none());
}

#[tokio::test]
async fn mutations_offline_issue_nothing() {
    let mut h = harness_with(token_session());
    let skipped = OpOutcome::Skipped(SkipReason::Offline);

    assert_eq!(h.client.delete_file("a.txt").await, skipped);
    assert_eq!(h.client.create_directory("d").await, skipped);
    assert_eq!(h.client.fetch_versions("a.txt").await, skipped);
    assert!(h.http.requests().is_empty());
}

#[tokio::test]
async fn mutation_prefers_realtime_when_authenticated() {
    let mut h = harness_with(token_session());
    authenticated(&mut h).await;
    let before = h.http.requests().len();

    let outcome = h
        .client
        .write_file(FileChange::new("a.txt", "hello", "text"))
        .await;

    assert_eq!(outcome, OpOutcome::Sent(Route::Realtime));
    assert_eq!(h.server.sent_kinds(), vec!["auth", "file_change"]);
    assert_eq!(h.http.requests().len(), before);
    assert!(h.client.gate.pending().is_none());
}

#[tokio::test]
async fn mutation_falls_back_without_channel() {
    let mut h = harness();
    online_with_token(&mut h).await;
    h.sink.clear();

    let outcome = h.client.delete_file("dir/a.txt").await;
    assert_eq!(outcome, OpOutcome::Sent(Route::Fallback));
    settle(&mut h.client).await;

    let request = h.http.requests().pop().unwrap();
    assert_eq!(request.path, "/files/tok/dir%2Fa.txt");
    assert_eq!(request.token.as_deref(), Some("tok"));
    assert_eq!(
        h.sink.events(),
        vec![SyncEvent::MutationApplied {
            kind: RequestKind::DeleteFile,
            path: "dir/a.txt".into()
        }]
    );
}

#[tokio::test]
async fn fallback_failure_reports_reason_and_releases_gate() {
    let mut h = harness();
    online_with_token(&mut h).await;
    h.sink.clear();
    h.http.respond(500, json!({"error": "disk_full"}));

    h.client.create_directory("d").await;
    settle(&mut h.client).await;

    assert_eq!(
        h.sink.events(),
        vec![SyncEvent::MutationFailed {
            kind: RequestKind::CreateDirectory,
            path: "d".into(),
            reason: "disk_full".into()
        }]
    );
    assert!(h.client.gate.pending().is_none());
}

#[tokio::test]
async fn transport_failure_releases_gate() {
    let mut h = harness();
    online_with_token(&mut h).await;
    h.sink.clear();
    h.http.fail(HttpError::Timeout);

    h.client.fetch_versions("a.txt").await;
    settle(&mut h.client).await;

    assert_eq!(
        h.sink.events(),
        vec![SyncEvent::VersionHistoryFailed {
            path: "a.txt".into(),
            reason: "request_failed".into()
        }]
    );
    assert_eq!(
        h.client.fetch_versions("a.txt").await,
        OpOutcome::Sent(Route::Fallback)
    );
}

#[tokio::test]
async fn malformed_body_still_releases_gate() {
    let mut h = harness();
    online_with_token(&mut h).await;
    h.sink.clear();
    h.http.respond_raw(200, "<html>");

    h.client.fetch_filesystem().await;
    settle(&mut h.client).await;

    assert_eq!(h.sink.names(), vec!["filesystem_sync_failed"]);
    assert!(h.client.gate.pending().is_none());
}

#[tokio::test]
async fn version_history_and_restore_events() {
    let mut h = harness();
    online_with_token(&mut h).await;
    h.sink.clear();
    h.http.respond(
        200,
        json!({"path": "a.txt", "current": 2, "versions": [{"version": 1, "content": "old"}]}),
    );
    h.client.fetch_versions("a.txt").await;
    settle(&mut h.client).await;

    h.client.restore_version("a.txt", 1).await;
    settle(&mut h.client).await;

    let events = h.sink.events();
    match &events[0] {
        SyncEvent::VersionHistory(history) => {
            assert_eq!(history.current, 2);
            assert_eq!(history.get(1).unwrap().content, "old");
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(
        events[1],
        SyncEvent::VersionRestored {
            path: "a.txt".into(),
            version: 1
        }
    );
}

#[tokio::test]
async fn filesystem_push_and_fetch() {
    let mut h = harness();
    online_with_token(&mut h).await;
    h.sink.clear();

    h.client.push_filesystem(json!({"home": {}})).await;
    settle(&mut h.client).await;
    let request = h.http.requests().pop().unwrap();
    assert_eq!(request.path, "/filesystem/tok");
    assert_eq!(request.body.unwrap(), json!({"filesystem": {"home": {}}}));

    h.http.respond(200, json!({"filesystem": {"home": {"a.txt": "x"}}}));
    h.client.fetch_filesystem().await;
    settle(&mut h.client).await;

    assert_eq!(
        h.sink.events(),
        vec![
            SyncEvent::FilesystemPushed,
            SyncEvent::FilesystemFetched {
                filesystem: json!({"home": {"a.txt": "x"}})
            }
        ]
    );
}

#[tokio::test]
async fn full_sync_is_realtime_only() {
    let mut h = harness_with(token_session());
    go_online(&mut h).await;
    let before = h.http.requests().len();

    // Channel still connecting, not authenticated
    assert_eq!(
        h.client.request_full_sync(None).await,
        OpOutcome::Skipped(SkipReason::RealtimeUnavailable)
    );
    assert_eq!(h.http.requests().len(), before);

    settle(&mut h.client).await;
    h.server.push(ServerMessage::auth_ok("NEO"));
    pump(&mut h.client).await;

    assert_eq!(
        h.client.request_full_sync(Some("2026-01-01".into())).await,
        OpOutcome::Sent(Route::Realtime)
    );
    assert_eq!(
        h.server.sent().last().unwrap(),
        &ClientMessage::request_sync(Some("2026-01-01".into()))
    );
}

#[tokio::test]
async fn online_transition_connects_when_token_present() {
    let mut h = harness_with(token_session());
    go_online(&mut h).await;
    assert_eq!(h.client.realtime_phase(), Phase::Connecting);
    settle(&mut h.client).await;

    assert_eq!(h.client.realtime_phase(), Phase::Open);
    assert_eq!(
        h.sink.names(),
        vec!["connectivity_changed", "realtime_connected"]
    );
    assert_eq!(h.server.sent(), vec![ClientMessage::auth("tok")]);
}

#[tokio::test]
async fn online_transition_without_token_stays_disconnected() {
    let mut h = harness();
    go_online(&mut h).await;
    assert_eq!(h.client.realtime_phase(), Phase::Disconnected);
    assert_eq!(h.server.connects(), 0);
}

#[tokio::test]
async fn offline_transition_closes_channel() {
    let mut h = harness_with(token_session());
    authenticated(&mut h).await;

    h.http.fail(HttpError::Connect("refused".into()));
    assert!(h.client.check_now());
    settle(&mut h.client).await;

    assert!(!h.client.is_online());
    assert_eq!(h.client.realtime_phase(), Phase::Disconnected);
    assert!(h.client.channel.reconnect_at().is_none());
    assert_eq!(
        h.sink.events(),
        vec![
            SyncEvent::ConnectivityChanged { online: false },
            SyncEvent::RealtimeDisconnected
        ]
    );
}

#[tokio::test]
async fn dropped_channel_reconnects_only_when_eligible() {
    let mut h = harness_with(token_session());
    authenticated(&mut h).await;

    h.server.close();
    pump(&mut h.client).await;
    assert_eq!(h.sink.names(), vec!["realtime_disconnected"]);
    assert!(h.client.channel.reconnect_at().is_some());

    h.client.on_reconnect_due();
    assert_eq!(h.client.realtime_phase(), Phase::Connecting);
    settle(&mut h.client).await;
    assert_eq!(h.server.connects(), 2);

    h.client.logout().await;
    h.client.channel.handle_closed().await;
    h.client.on_reconnect_due();
    assert_eq!(h.client.realtime_phase(), Phase::Disconnected);
    assert!(h.client.channel.reconnect_at().is_none());
}

#[tokio::test]
async fn remote_changes_are_forwarded() {
    let mut h = harness_with(token_session());
    authenticated(&mut h).await;

    h.server
        .push(ServerMessage::FileChanged(FileChange::new("a.txt", "hi", "text")));
    h.server.push(ServerMessage::FileDeleted {
        path: "b.txt".into(),
    });
    pump(&mut h.client).await;
    pump(&mut h.client).await;

    assert_eq!(h.sink.names(), vec!["file_changed", "file_deleted"]);
}

#[tokio::test]
async fn logout_clears_and_persists_session() {
    let mut h = harness_with(token_session());
    authenticated(&mut h).await;

    assert_eq!(h.client.logout().await, OpOutcome::Completed);

    assert_eq!(*h.client.session(), Session::default());
    assert_eq!(h.store.load_session(), Session::default());
    assert_eq!(h.client.realtime_phase(), Phase::Disconnected);
    assert_eq!(h.sink.names(), vec!["realtime_disconnected", "logged_out"]);
    assert_eq!(
        h.client.delete_file("a.txt").await,
        OpOutcome::Skipped(SkipReason::NotAuthenticated)
    );
}

#[tokio::test]
async fn check_now_is_single_flight() {
    let mut h = harness();
    assert!(h.client.check_now());
    assert!(!h.client.check_now());
    settle(&mut h.client).await;
    assert!(h.client.check_now());
}

#[tokio::test]
async fn first_contact_failures_ramp_linearly() {
    let mut h = harness();
    let mut intervals = Vec::new();
    for _ in 0..3 {
        h.http.fail(HttpError::Connect("refused".into()));
        assert!(h.client.check_now());
        settle(&mut h.client).await;
        intervals.push(h.client.connection_state().current_retry_interval.as_secs());
    }
    assert_eq!(intervals, vec![3, 5, 7]);
    // Already offline, so no transition events
    assert!(h.sink.events().is_empty());
}

#[tokio::test]
async fn dropped_task_still_completes() {
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion<MockTransport>>();
    let guard = CompletionGuard::new(
        tx,
        Completion::Request {
            call: PendingCall::FetchVersions("a.txt".into()),
            result: Err(HttpError::Aborted),
        },
    );
    drop(guard);

    match rx.recv().await {
        Some(Completion::Request { call, result }) => {
            assert_eq!(call, PendingCall::FetchVersions("a.txt".into()));
            assert!(matches!(result, Err(HttpError::Aborted)));
        }
        _ => panic!("expected aborted request completion"),
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_connect_times_out_and_schedules_reconnect() {
    let config = ClientConfig {
        request_timeout_ms: 1000,
        ..ClientConfig::default()
    };
    let mut h = harness_from(config, token_session());
    h.server.stall_next_connect();
    go_online(&mut h).await;
    assert_eq!(h.client.realtime_phase(), Phase::Connecting);

    let started = Instant::now();
    settle(&mut h.client).await;

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(h.client.realtime_phase(), Phase::Disconnected);
    assert!(h.client.channel.reconnect_at().is_some());
    assert_eq!(h.server.connects(), 1);
}

#[tokio::test]
async fn aborted_connect_task_still_completes() {
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion<MockTransport>>();
    let guard = CompletionGuard::new(
        tx,
        Completion::Connected {
            attempt: 3,
            result: Err(TransportError::Connect("connect task aborted".into())),
        },
    );
    drop(guard);

    match rx.recv().await {
        Some(Completion::Connected { attempt, result }) => {
            assert_eq!(attempt, 3);
            assert!(matches!(result, Err(TransportError::Connect(_))));
        }
        _ => panic!("expected aborted connect completion"),
    }
}

#[tokio::test]
async fn handle_drives_running_client() {
    let h = harness();
    let http = h.http.clone();
    let cancel = CancellationToken::new();
    let (handle, task) = h.client.spawn(cancel.clone());

    let outcome = handle.delete_file("a.txt").await.unwrap();
    assert_eq!(outcome, OpOutcome::Skipped(SkipReason::NotAuthenticated));
    let status = handle.status().await.unwrap();
    assert!(!status.authenticated);
    assert_eq!(status.realtime, "disconnected");

    cancel.cancel();
    task.await.unwrap();
    assert!(matches!(
        handle.check_now().await,
        Err(Error::ClientStopped)
    ));
    assert!(http.paths().iter().all(|p| p == "/status"));
}

#[test]
fn outcome_reasons() {
    assert_eq!(
        OpOutcome::Skipped(SkipReason::Offline).reason(),
        Some("offline")
    );
    assert_eq!(
        OpOutcome::Skipped(SkipReason::NotAuthenticated).reason(),
        Some("not_authenticated")
    );
    assert_eq!(OpOutcome::Busy.reason(), Some("request_in_progress"));
    assert_eq!(OpOutcome::Sent(Route::Realtime).reason(), None);
    assert!(OpOutcome::Completed.is_accepted());
    assert!(!OpOutcome::Busy.is_accepted());
}
