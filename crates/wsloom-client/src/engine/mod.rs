//! Request/response engine.
//!
//! Builds request envelopes, registers them in the correlation table,
//! transmits through the current transport session, arbitrates per-request
//! timeouts, and demultiplexes inbound frames into response resolution and
//! push events. Protocol anomalies (unknown ids, undecodable frames,
//! server-sent requests) are logged and never tear down the session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::broadcast;

use wsloom_core::error::{Result, WsLoomError};
use wsloom_core::protocol::{decode, encode, Envelope, MessageType};

use crate::correlation::CorrelationTable;
use crate::transport::TransportSession;

const PUSH_CHANNEL_CAPACITY: usize = 64;

struct BoundSession {
    epoch: u64,
    session: TransportSession,
}

/// Engine over one current transport session and one correlation table.
pub struct RequestEngine {
    table: Arc<CorrelationTable>,
    session: Mutex<Option<BoundSession>>,
    epoch: AtomicU64,
    push_tx: broadcast::Sender<Envelope>,
    response_timeout: Duration,
}

impl RequestEngine {
    pub fn new(response_timeout: Duration, table: CorrelationTable) -> Self {
        let (push_tx, _) = broadcast::channel(PUSH_CHANNEL_CAPACITY);
        Self {
            table: Arc::new(table),
            session: Mutex::new(None),
            epoch: AtomicU64::new(0),
            push_tx,
            response_timeout,
        }
    }

    /// Make `session` the current one. Returns the epoch the caller's pump
    /// must present to `clear_session` so a stale pump cannot clear a
    /// replacement.
    pub fn bind_session(&self, session: TransportSession) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let mut guard = lock_unpoisoned(&self.session);
        *guard = Some(BoundSession { epoch, session });
        epoch
    }

    /// Clear the current session if `epoch` still identifies it. Returns
    /// whether anything was cleared.
    pub fn clear_session(&self, epoch: u64) -> bool {
        let mut guard = lock_unpoisoned(&self.session);
        match guard.as_ref() {
            Some(bound) if bound.epoch == epoch => {
                *guard = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the current session unconditionally (planned shutdown).
    pub fn close_session(&self) {
        let mut guard = lock_unpoisoned(&self.session);
        *guard = None;
    }

    /// Send one request and await its single resolution: the matching
    /// response envelope, a local failure, or a timeout.
    ///
    /// While no session is bound (e.g. a reconnection cycle is running)
    /// the call fails immediately with `ConnectionUnavailable`; requests
    /// are not queued.
    pub async fn send(&self, subtype: &str, payload: Value) -> Result<Envelope> {
        let id = self.table.generate_id();
        let pending = self.table.register(&id)?;

        let envelope = Envelope::request(id.clone(), subtype, payload);
        let text = match encode(&envelope) {
            Ok(text) => text,
            Err(err) => {
                self.table.discard(&id);
                return Err(err);
            }
        };

        if let Err(err) = self.transmit(text) {
            self.table.discard(&id);
            return Err(err);
        }

        let timer = tokio::spawn({
            let table = Arc::clone(&self.table);
            let id = id.clone();
            let timeout = self.response_timeout;
            async move {
                tokio::time::sleep(timeout).await;
                table.expire(&id);
            }
        });
        self.table.arm_timeout(&id, timer.abort_handle());

        pending.wait().await
    }

    fn transmit(&self, text: String) -> Result<()> {
        let guard = lock_unpoisoned(&self.session);
        match guard.as_ref() {
            Some(bound) => bound.session.send(text),
            None => Err(WsLoomError::ConnectionUnavailable),
        }
    }

    /// Decode one inbound frame and dispatch its envelopes in order.
    pub fn dispatch_frame(&self, text: &str) {
        match decode(text) {
            Ok(inbound) => {
                for envelope in inbound.into_envelopes() {
                    self.dispatch(envelope);
                }
            }
            Err(err) => tracing::warn!(error = %err, "dropping undecodable frame"),
        }
    }

    /// Route one envelope: responses resolve pending requests, pushes are
    /// re-checked for the bad-message reinterpretation and otherwise
    /// broadcast to subscribers.
    pub fn dispatch(&self, envelope: Envelope) {
        match envelope.msg_type {
            MessageType::Response => {
                let Some(id) = envelope.id.clone() else {
                    tracing::warn!("dropping response without id");
                    return;
                };
                if let Err(err) = self.table.resolve(&id, envelope) {
                    tracing::warn!(%id, error = %err, "response for unknown id");
                }
            }
            MessageType::Push => match reinterpret_bad_message(&envelope) {
                Some(response) => self.dispatch(response),
                None => {
                    let _ = self.push_tx.send(envelope);
                }
            },
            MessageType::Request => {
                tracing::warn!("server sent a request envelope; ignoring");
            }
        }
    }

    /// Perform the protocol handshake on the current session.
    pub async fn handshake(&self, protocol_version: u32) -> Result<Value> {
        let payload = json!({
            "supportedVersions": [protocol_version],
            "sessionId": null,
        });
        let response = self.send("handshake", payload).await?;
        let rp = response.response_payload()?;
        if rp.success {
            return Ok(rp.data.unwrap_or(Value::Null));
        }

        let error = rp.error.unwrap_or(Value::Null);
        if is_session_expired(&error) {
            Err(WsLoomError::SessionExpired)
        } else {
            Err(WsLoomError::HandshakeRejected(error))
        }
    }

    /// Subscribe to server-initiated push envelopes.
    pub fn subscribe_push(&self) -> broadcast::Receiver<Envelope> {
        self.push_tx.subscribe()
    }

    pub fn pending_count(&self) -> usize {
        self.table.pending_count()
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // Holders never panic while locked; recover the guard either way so a
    // poisoned mutex cannot wedge the session.
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn is_session_expired(error: &Value) -> bool {
    error.get("id").and_then(Value::as_str) == Some("sessionExpired")
}

/// Push-as-response reinterpretation.
///
/// The server cannot correlate certain malformed requests and instead
/// reports them asynchronously as a push error that echoes the offending
/// request's body. Such an envelope is rewritten into the response for the
/// echoed request id and routed through the response path instead of being
/// emitted as a push event.
fn reinterpret_bad_message(envelope: &Envelope) -> Option<Envelope> {
    let error = envelope.payload.get("error")?;
    if error.get("id")?.as_str()? != "badMessage" {
        return None;
    }
    let echoed = error.get("details")?.get("message")?.as_str()?;
    let original: Value = serde_json::from_str(echoed).ok()?;
    let id = original.get("id")?.as_str()?.to_string();

    Some(Envelope {
        id: Some(id),
        msg_type: MessageType::Response,
        subtype: envelope.subtype.clone(),
        payload: envelope.payload.clone(),
    })
}
