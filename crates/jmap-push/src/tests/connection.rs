//! Connection lifecycle: shared start, ticket handling, stop, restart.

use super::harness::{state_change, subscribed, wait_until, ServerCommand, TestHarness, WAIT};
use crate::{PushError, PushState};
use futures_util::future::join_all;
use futures_util::StreamExt;
use jmap_client::{JmapError, TransportError};
use jmap_protocol_types::AccountStates;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn concurrent_starts_share_one_attempt() {
    let h = TestHarness::new().await;

    let results = join_all((0..5).map(|_| {
        let push = h.push.clone();
        async move { push.start().await }
    }))
    .await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(h.transport.ticket_posts(), 1);
    wait_until(|| h.server.connections() == 1).await;
    assert_eq!(h.push.state(), PushState::Open);

    // Starting an open connection is a no-op
    h.push.start().await.unwrap();
    assert_eq!(h.transport.ticket_posts(), 1);
    assert_eq!(h.server.connections(), 1);
}

#[tokio::test]
async fn ticket_is_passed_as_query_parameter() {
    let h = TestHarness::new().await;

    h.push.start().await.unwrap();

    wait_until(|| !h.server.uris().is_empty()).await;
    assert_eq!(h.server.uris(), vec!["/jmap/ws?ticket=ticket-1"]);
}

#[tokio::test]
async fn start_without_session_sends_nothing() {
    let h = TestHarness::unfetched().await;

    let err = h.push.start().await.unwrap_err();

    match err {
        PushError::Client(inner) => {
            assert!(matches!(*inner, JmapError::SessionNotInitialized))
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(h.transport.ticket_posts(), 0);
    assert_eq!(h.server.connections(), 0);
    assert_eq!(h.push.state(), PushState::Idle);
}

#[tokio::test]
async fn ticket_failure_rejects_every_starter() {
    let h = TestHarness::new().await;
    h.transport.fail_tickets(true);

    let results = join_all((0..3).map(|_| {
        let push = h.push.clone();
        async move { push.start().await }
    }))
    .await;

    for result in results {
        match result {
            Err(PushError::Ticket(inner)) => {
                assert!(matches!(*inner, TransportError::Status { status: 401, .. }))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
    assert_eq!(h.transport.ticket_posts(), 1);
    assert_eq!(h.push.state(), PushState::Idle);

    // A later start makes a fresh attempt
    h.transport.fail_tickets(false);
    h.push.start().await.unwrap();
    assert_eq!(h.transport.ticket_posts(), 2);
    assert_eq!(h.push.state(), PushState::Open);
}

#[tokio::test]
async fn stop_when_idle_is_a_no_op() {
    let h = TestHarness::new().await;

    h.push.stop();
    h.push.stop();

    assert_eq!(h.push.state(), PushState::Idle);
    assert_eq!(h.transport.ticket_posts(), 0);
}

#[tokio::test]
async fn stop_closes_and_restart_opens_fresh_connection() {
    let h = TestHarness::new().await;
    let mut mailbox = subscribed(h.push.mailbox());
    h.push.start().await.unwrap();
    h.server.wait_for_frames(1).await;

    h.push.stop();
    h.push.stop();

    // Clean close: the stream completes without an error
    let next = tokio::time::timeout(WAIT, mailbox.next())
        .await
        .unwrap();
    assert!(next.is_none());
    assert_eq!(h.push.state(), PushState::Idle);
    assert!(h.push.subscribed_entity_types().is_empty());

    h.push.start().await.unwrap();
    wait_until(|| h.server.connections() == 2).await;
    assert_eq!(h.transport.ticket_posts(), 2);
    assert_eq!(
        h.server.uris(),
        vec!["/jmap/ws?ticket=ticket-1", "/jmap/ws?ticket=ticket-2"]
    );
}

#[tokio::test]
async fn server_close_resets_to_idle() {
    let h = TestHarness::new().await;
    let mut email = subscribed(h.push.email());
    h.push.start().await.unwrap();
    h.server.wait_for_frames(1).await;

    h.server.command(ServerCommand::Close);

    let next = tokio::time::timeout(WAIT, email.next())
        .await
        .unwrap();
    assert!(next.is_none());
    assert_eq!(h.push.state(), PushState::Idle);
}

#[tokio::test]
async fn start_right_after_stop_opens_a_new_connection() {
    let h = TestHarness::new().await;
    let mut mailbox = subscribed(h.push.mailbox());
    h.push.start().await.unwrap();
    h.server.wait_for_frames(1).await;

    h.push.stop();
    h.push.start().await.unwrap();

    assert_eq!(h.push.state(), PushState::Open);
    assert_eq!(h.transport.ticket_posts(), 2);
    wait_until(|| h.server.connections() == 2).await;
    // The stopped connection's stream has ended
    assert!(tokio::time::timeout(WAIT, mailbox.next())
        .await
        .unwrap()
        .is_none());

    // The old socket finishing its close must not reset the new one
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.push.state(), PushState::Open);

    let mut email = subscribed(h.push.email());
    h.server.wait_for_frames(3).await;
    assert_eq!(
        h.server.enabled_sets(),
        vec![vec!["Mailbox"], vec![], vec!["Email"]]
    );

    h.server
        .send_json(state_change(json!({ "acct1": { "Email": "e1" } })));
    let change = tokio::time::timeout(WAIT, email.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(change, AccountStates::from([("acct1".into(), "e1".into())]));
}
