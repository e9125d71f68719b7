//! Client session object.
//!
//! `WsLoomClient` is the explicitly constructed composition root: it owns
//! the config, the request engine, and the reconnection controller, and it
//! is injected into consumers instead of living as ambient global state.
//! Exactly one instance is alive per running application; construct at
//! startup, `close()` at shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch};

use wsloom_core::error::{Result, WsLoomError};
use wsloom_core::protocol::Envelope;

use crate::config::ClientConfig;
use crate::correlation::CorrelationTable;
use crate::engine::RequestEngine;
use crate::expiry::ExpiryMarker;
use crate::origin;
use crate::reconnect::{self, ReconnectHandle, ReconnectState, ReconnectStatus, ReconnectTarget};
use crate::transport::{Connector, SessionEvent, WsConnector};

struct SessionCore {
    cfg: ClientConfig,
    endpoint: String,
    connector: Arc<dyn Connector>,
    engine: Arc<RequestEngine>,
    ready: watch::Sender<bool>,
    invalidated: watch::Sender<bool>,
    expiry: ExpiryMarker,
    reconnect: OnceLock<ReconnectHandle>,
    shutting_down: AtomicBool,
}

impl SessionCore {
    /// One full connection attempt: transport open, pump start, handshake.
    /// Ready is signalled only after the handshake resolves.
    async fn open_and_handshake(core: &Arc<Self>) -> Result<Value> {
        let mut session = core.connector.connect(&core.endpoint).await?;
        let events = session
            .take_events()
            .ok_or_else(|| WsLoomError::Internal("session event stream already taken".into()))?;

        let epoch = core.engine.bind_session(session);
        Self::spawn_pump(core, epoch, events);

        // A rejected handshake must not leave the session bound: sends
        // during the failure window fail with connection-unavailable
        // instead of transmitting into a half-established socket.
        let data = match core
            .engine
            .handshake(core.cfg.handshake.protocol_version)
            .await
        {
            Ok(data) => data,
            Err(err) => {
                core.engine.clear_session(epoch);
                core.ready.send_replace(false);
                return Err(err);
            }
        };
        core.ready.send_replace(true);
        tracing::info!("transport open and handshake complete");
        Ok(data)
    }

    /// Per-session event pump: decodes frames into the engine until the
    /// session closes. A stale pump (its session already replaced) exits
    /// without side effects.
    fn spawn_pump(
        core: &Arc<Self>,
        epoch: u64,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let core = Arc::clone(core);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    SessionEvent::Message(text) => core.engine.dispatch_frame(&text),
                    SessionEvent::Error(e) => tracing::warn!(error = %e, "transport error"),
                    SessionEvent::Closed => break,
                }
            }

            if !core.engine.clear_session(epoch) {
                return;
            }
            core.ready.send_replace(false);

            if core.shutting_down.load(Ordering::SeqCst) {
                tracing::info!("transport closed (shutdown)");
                return;
            }

            // Pending requests are left to their own timeouts; reconnection
            // and request timeout are independent.
            tracing::warn!("transport closed unexpectedly; reconnection engaged");
            if let Some(handle) = core.reconnect.get() {
                handle.connection_lost();
            }
        });
    }

    fn escalate_expiry(&self) {
        if let Err(e) = self.expiry.set() {
            tracing::error!(error = %e, "failed to persist session-expiry marker");
        }
        self.ready.send_replace(false);
        self.invalidated.send_replace(true);
        tracing::warn!("session expired; application session invalidated");
    }
}

struct Target(Arc<SessionCore>);

#[async_trait]
impl ReconnectTarget for Target {
    async fn attempt(&self) -> Result<()> {
        SessionCore::open_and_handshake(&self.0).await.map(|_| ())
    }

    async fn escalate_session_expiry(&self) {
        self.0.escalate_expiry();
    }
}

/// The single client over one persistent connection.
pub struct WsLoomClient {
    core: Arc<SessionCore>,
    reconnect: ReconnectHandle,
}

impl WsLoomClient {
    /// Client with the production WebSocket connector.
    ///
    /// Must be called inside a tokio runtime: the reconnection controller
    /// task is spawned here.
    pub fn new(cfg: ClientConfig) -> Self {
        Self::with_connector(cfg, Arc::new(WsConnector))
    }

    /// Client with an injected connector (tests plug a stub in here).
    pub fn with_connector(cfg: ClientConfig, connector: Arc<dyn Connector>) -> Self {
        let endpoint = origin::endpoint_from_config(&cfg);
        let engine = Arc::new(RequestEngine::new(
            Duration::from_millis(cfg.connection.response_timeout_ms),
            CorrelationTable::new(),
        ));
        let expiry = ExpiryMarker::new(&cfg.session.expiry_marker_path);
        let reconnect_cfg = cfg.reconnect.clone();

        let core = Arc::new(SessionCore {
            cfg,
            endpoint,
            connector,
            engine,
            ready: watch::channel(false).0,
            invalidated: watch::channel(false).0,
            expiry,
            reconnect: OnceLock::new(),
            shutting_down: AtomicBool::new(false),
        });

        let handle = reconnect::spawn(reconnect_cfg, Arc::new(Target(Arc::clone(&core))));
        let _ = core.reconnect.set(handle.clone());

        Self {
            core,
            reconnect: handle,
        }
    }

    /// Open the transport and perform the handshake; resolves with the
    /// handshake data. This is the externally observable "ready" signal.
    pub async fn init_connection(&self) -> Result<Value> {
        SessionCore::open_and_handshake(&self.core).await
    }

    /// Resolves once transport open + handshake have succeeded (again,
    /// after a recovery).
    pub async fn on_ready(&self) -> Result<()> {
        let mut rx = self.core.ready.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return Ok(());
            }
            rx.changed()
                .await
                .map_err(|_| WsLoomError::Internal("client torn down".into()))?;
        }
    }

    /// Generic RPC primitive: one request, one resolution.
    pub async fn send(&self, subtype: &str, payload: impl Serialize) -> Result<Envelope> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| WsLoomError::Serialization(format!("payload encode failed: {e}")))?;
        self.core.engine.send(subtype, payload).await
    }

    /// Subscription for server-initiated messages.
    pub fn subscribe_push(&self) -> broadcast::Receiver<Envelope> {
        self.core.engine.subscribe_push()
    }

    /// Reconnection state snapshots for a status-rendering collaborator.
    pub fn reconnect_status(&self) -> watch::Receiver<ReconnectStatus> {
        self.reconnect.status()
    }

    /// Explicit user action: attempt reconnection now, bypassing any
    /// pending wait. Resolves when the triggered attempt recovers the
    /// connection; fails when it does not.
    pub async fn reconnect(&self) -> Result<()> {
        let mut status = self.reconnect.status();
        status.borrow_and_update();
        self.reconnect.retry_now();

        loop {
            status
                .changed()
                .await
                .map_err(|_| WsLoomError::Internal("reconnector gone".into()))?;
            let state = status.borrow_and_update().state;
            match state {
                ReconnectState::Closed => {
                    let invalidated = *self.core.invalidated.subscribe().borrow();
                    if invalidated {
                        return Err(WsLoomError::SessionExpired);
                    }
                    return Ok(());
                }
                ReconnectState::Error | ReconnectState::Waiting | ReconnectState::Timeout => {
                    return Err(WsLoomError::ConnectFailed(
                        "manual reconnection attempt failed".into(),
                    ));
                }
                ReconnectState::Init | ReconnectState::Connecting => {}
            }
        }
    }

    /// Latched once a session-expired failure was escalated.
    pub fn invalidated(&self) -> watch::Receiver<bool> {
        self.core.invalidated.subscribe()
    }

    /// Bootstrap call: was the previous session expired? Reads and clears
    /// the persisted marker.
    pub fn session_was_expired(&self) -> bool {
        self.core.expiry.take()
    }

    /// Planned shutdown: closes the current session without engaging the
    /// reconnection controller.
    pub fn close(&self) {
        self.core.shutting_down.store(true, Ordering::SeqCst);
        self.core.engine.close_session();
        self.core.ready.send_replace(false);
        tracing::info!("client closed");
    }
}
