//! Shared test support: scriptable stub transport.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use wsloom_client::transport::{Connector, SessionEvent, TransportSession};
use wsloom_core::error::{Result, WsLoomError};

/// Control half of one stub session: read what the client transmitted,
/// inject inbound frames, close the connection.
pub struct StubSession {
    outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl StubSession {
    /// Inject one inbound frame.
    pub fn push_frame(&self, frame: &Value) {
        let _ = self.events.send(SessionEvent::Message(frame.to_string()));
    }

    /// Server-side close.
    pub fn close(&self) {
        let _ = self.events.send(SessionEvent::Closed);
    }

    /// Next frame the client transmitted, parsed as JSON.
    pub async fn next_outbound(&mut self) -> Value {
        let text = self
            .outbound
            .recv()
            .await
            .expect("stub outbound channel closed");
        serde_json::from_str(&text).expect("outbound frame must be JSON")
    }

    /// Answer the handshake request with a success response.
    pub async fn complete_handshake(&mut self) {
        let req = self.next_outbound().await;
        assert_eq!(req["subtype"], "handshake");
        let id = req["id"].as_str().expect("handshake request must carry an id");
        self.push_frame(&json!({
            "id": id,
            "type": "response",
            "payload": { "success": true, "data": { "sessionId": "s1" } },
        }));
    }

    /// Reject the handshake with an ordinary (retryable) error.
    pub async fn reject_handshake(&mut self) {
        let req = self.next_outbound().await;
        let id = req["id"].as_str().expect("handshake request must carry an id");
        self.push_frame(&json!({
            "id": id,
            "type": "response",
            "payload": { "success": false, "error": { "id": "unsupportedVersion" } },
        }));
    }

    /// Reject the handshake with the authorization-flavored error.
    pub async fn reject_handshake_expired(&mut self) {
        let req = self.next_outbound().await;
        let id = req["id"].as_str().expect("handshake request must carry an id");
        self.push_frame(&json!({
            "id": id,
            "type": "response",
            "payload": { "success": false, "error": { "id": "sessionExpired" } },
        }));
    }
}

/// A connected stub session pair: the transport half for the engine, the
/// control half for the test.
pub fn stub_session() -> (TransportSession, StubSession) {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    (
        TransportSession::from_parts(out_tx, event_rx),
        StubSession {
            outbound: out_rx,
            events: event_tx,
        },
    )
}

enum Outcome {
    Ok,
    Fail,
}

/// Connector whose successive `connect` calls follow a script; succeeds
/// once the script is exhausted.
pub struct StubConnector {
    plan: Mutex<VecDeque<Outcome>>,
    sessions: mpsc::UnboundedSender<StubSession>,
    connects: AtomicUsize,
}

#[async_trait]
impl Connector for StubConnector {
    async fn connect(&self, _url: &str) -> Result<TransportSession> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .plan
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Outcome::Ok);
        match outcome {
            Outcome::Fail => Err(WsLoomError::ConnectFailed("stub connect refused".into())),
            Outcome::Ok => {
                let (session, control) = stub_session();
                self.sessions
                    .send(control)
                    .map_err(|_| WsLoomError::Internal("stub control receiver dropped".into()))?;
                Ok(session)
            }
        }
    }
}

/// Test-side handle over a [`StubConnector`].
pub struct StubControl {
    connector: Arc<StubConnector>,
    sessions: mpsc::UnboundedReceiver<StubSession>,
}

impl StubControl {
    /// Make the next `n` connect calls fail.
    pub fn plan_failures(&self, n: usize) {
        let mut plan = self.connector.plan.lock().unwrap();
        for _ in 0..n {
            plan.push_back(Outcome::Fail);
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connector.connects.load(Ordering::SeqCst)
    }

    /// Control half of the next successfully connected session.
    pub async fn next_session(&mut self) -> StubSession {
        self.sessions
            .recv()
            .await
            .expect("no stub session produced")
    }
}

pub fn stub_connector() -> (Arc<StubConnector>, StubControl) {
    let (sessions_tx, sessions_rx) = mpsc::unbounded_channel();
    let connector = Arc::new(StubConnector {
        plan: Mutex::new(VecDeque::new()),
        sessions: sessions_tx,
        connects: AtomicUsize::new(0),
    });
    (
        Arc::clone(&connector),
        StubControl {
            connector,
            sessions: sessions_rx,
        },
    )
}
