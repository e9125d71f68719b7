//! Reconnection controller behavior against a scriptable connector.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use wsloom_client::client::WsLoomClient;
use wsloom_client::config::{self, ClientConfig};
use wsloom_client::reconnect::ReconnectState;

fn test_config(tag: &str) -> ClientConfig {
    let marker = std::env::temp_dir().join(format!(
        "wsloom-{tag}-{}.expired",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&marker);
    let yaml = format!(
        r#"
version: 1
reconnect:
  max_attempts: 10
  seconds_increment: 5
session:
  expiry_marker_path: "{}"
"#,
        marker.display()
    );
    config::load_from_str(&yaml).unwrap()
}

#[tokio::test(start_paused = true)]
async fn backoff_schedule_gives_up_then_manual_retry_recovers() {
    let (connector, mut ctl) = support::stub_connector();
    let client = WsLoomClient::with_connector(test_config("backoff"), connector);

    let (init, s0) = tokio::join!(client.init_connection(), async {
        let mut s = ctl.next_session().await;
        s.complete_handshake().await;
        s
    });
    assert_eq!(init.unwrap()["sessionId"], "s1");
    assert_eq!(ctl.connect_count(), 1);

    // Every attempt of the coming cycle fails: the immediate one plus ten
    // scheduled retries.
    ctl.plan_failures(11);
    let mut status = client.reconnect_status();
    s0.close();

    // First observed Waiting snapshot per attempt carries the full
    // countdown: 5s, 10s, ..., 50s.
    let mut first_waits: Vec<(u32, u32)> = Vec::new();
    let timed_out = loop {
        status.changed().await.unwrap();
        let snap = status.borrow_and_update().clone();
        match snap.state {
            ReconnectState::Waiting => {
                if first_waits.last().map(|(a, _)| *a) != Some(snap.attempt) {
                    first_waits.push((snap.attempt, snap.countdown_secs));
                }
            }
            ReconnectState::Timeout => break snap,
            _ => {}
        }
    };

    assert_eq!(timed_out.attempt, 10);
    assert_eq!(first_waits.len(), 10);
    for (n, (attempt, countdown)) in first_waits.iter().enumerate() {
        assert_eq!(*attempt as usize, n + 1);
        assert_eq!(*countdown as usize, 5 * (n + 1));
    }
    assert_eq!(ctl.connect_count(), 12);

    // Automatic scheduling has stopped for good.
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(ctl.connect_count(), 12);

    // Requests during the outage are rejected, not queued.
    let err = client
        .send("rpc", json!({ "n": 1 }))
        .await
        .expect_err("no connection");
    assert_eq!(err.failure_code().as_str(), "connection-unavailable");

    // Manual retry goes straight back to connecting and recovers without
    // incrementing past max.
    let (retried, _s1) = tokio::join!(client.reconnect(), async {
        let mut s = ctl.next_session().await;
        s.complete_handshake().await;
        s
    });
    retried.unwrap();

    let snap = client.reconnect_status().borrow().clone();
    assert_eq!(snap.state, ReconnectState::Closed);
    assert_eq!(snap.attempt, 10);
    assert_eq!(ctl.connect_count(), 13);
}

#[tokio::test(start_paused = true)]
async fn automatic_retry_recovers_after_transient_failure() {
    let (connector, mut ctl) = support::stub_connector();
    let client = Arc::new(WsLoomClient::with_connector(
        test_config("transient"),
        connector,
    ));

    let (init, mut s0) = tokio::join!(client.init_connection(), async {
        let mut s = ctl.next_session().await;
        s.complete_handshake().await;
        s
    });
    init.unwrap();

    // A request that will never be answered: it must ride out its own
    // timeout, independent of the reconnection below.
    let silent = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.send("rpc", json!({ "n": 1 })).await }
    });
    let frame = s0.next_outbound().await;
    assert_eq!(frame["subtype"], "rpc");

    // The immediate reconnection attempt fails; the retry after 5s
    // succeeds.
    ctl.plan_failures(1);
    let mut status = client.reconnect_status();
    s0.close();

    loop {
        status.changed().await.unwrap();
        if status.borrow_and_update().state != ReconnectState::Closed {
            break;
        }
    }

    let (ready, _s1) = tokio::join!(client.on_ready(), async {
        let mut s = ctl.next_session().await;
        s.complete_handshake().await;
        s
    });
    ready.unwrap();

    let snap = client.reconnect_status().borrow().clone();
    assert_eq!(snap.state, ReconnectState::Closed);
    assert_eq!(snap.attempt, 1);
    assert_eq!(ctl.connect_count(), 3);

    let err = silent.await.unwrap().expect_err("never answered");
    assert_eq!(err.failure_code().as_str(), "timeout");
}

#[tokio::test(start_paused = true)]
async fn session_expiry_escalates_instead_of_retrying() {
    let (connector, mut ctl) = support::stub_connector();
    let cfg = test_config("expiry");
    let marker_path = cfg.session.expiry_marker_path.clone();
    let client = WsLoomClient::with_connector(cfg, connector);

    let (init, s0) = tokio::join!(client.init_connection(), async {
        let mut s = ctl.next_session().await;
        s.complete_handshake().await;
        s
    });
    init.unwrap();

    let mut invalidated = client.invalidated();
    s0.close();

    let (_, _s1) = tokio::join!(
        async {
            while !*invalidated.borrow_and_update() {
                invalidated.changed().await.unwrap();
            }
        },
        async {
            let mut s = ctl.next_session().await;
            s.reject_handshake_expired().await;
            s
        }
    );

    // No waiting, no retries: the cycle ended with the escalation.
    let snap = client.reconnect_status().borrow().clone();
    assert_eq!(snap.state, ReconnectState::Closed);
    assert_eq!(ctl.connect_count(), 2);
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(ctl.connect_count(), 2);

    // The persisted marker is read once and cleared.
    assert!(std::path::Path::new(&marker_path).exists());
    assert!(client.session_was_expired());
    assert!(!client.session_was_expired());
}
