//! Transport session: lifecycle and events of one connection instance.
//!
//! A `TransportSession` is terminal after `Closed`: a fresh instance is
//! constructed for every connection attempt, and the engine always sends
//! through the current one.

use async_trait::async_trait;
use tokio::sync::mpsc;

use wsloom_core::error::{Result, WsLoomError};

/// Structured events emitted by a session to its owner.
#[derive(Debug)]
pub enum SessionEvent {
    /// One inbound text frame.
    Message(String),
    /// Transport-level error; the session usually closes right after.
    Error(String),
    /// Terminal: the instance must not be reused.
    Closed,
}

/// One open connection: outbound frames in, session events out.
pub struct TransportSession {
    out: mpsc::UnboundedSender<String>,
    events: Option<mpsc::UnboundedReceiver<SessionEvent>>,
}

impl TransportSession {
    pub fn from_parts(
        out: mpsc::UnboundedSender<String>,
        events: mpsc::UnboundedReceiver<SessionEvent>,
    ) -> Self {
        Self {
            out,
            events: Some(events),
        }
    }

    /// Transmit a frame. Fails with `SendFailed` once the writer half is
    /// gone; the caller must fail the corresponding pending request rather
    /// than silently drop it.
    pub fn send(&self, text: String) -> Result<()> {
        self.out
            .send(text)
            .map_err(|_| WsLoomError::SendFailed("transport closed".into()))
    }

    /// Take the event stream. Consumed exactly once, by the owner's pump.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.events.take()
    }
}

/// Seam for producing connected sessions; the production implementation is
/// [`crate::transport::WsConnector`], tests plug in a scriptable stub.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a connection. Resolves once the underlying transport
    /// signals open; rejects with `ConnectFailed` otherwise.
    async fn connect(&self, url: &str) -> Result<TransportSession>;
}
