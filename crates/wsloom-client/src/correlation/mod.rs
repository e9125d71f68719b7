//! Correlation table: pending-request bookkeeping keyed by request id.
//!
//! Every in-flight request owns exactly one slot here. Removal from the
//! table is the linearization point for completion, so the resolve/expire
//! race is safe by construction: whichever path removes the slot delivers
//! the outcome, the other becomes a no-op.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use wsloom_core::error::{Result, WsLoomError};
use wsloom_core::protocol::{id, Envelope};

type Completion = Result<Envelope>;
type IdGenerator = dyn Fn() -> String + Send + Sync;

struct PendingSlot {
    tx: oneshot::Sender<Completion>,
    timer: Option<AbortHandle>,
}

impl PendingSlot {
    fn complete(self, outcome: Completion) {
        if let Some(timer) = self.timer {
            timer.abort();
        }
        // Receiver may already be gone (caller dropped the future).
        let _ = self.tx.send(outcome);
    }
}

/// Single-shot completion handle for one registered request.
#[derive(Debug)]
pub struct PendingRequest {
    rx: oneshot::Receiver<Completion>,
}

impl PendingRequest {
    /// Wait for resolution: matching response, local failure, or timeout.
    pub async fn wait(self) -> Result<Envelope> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(WsLoomError::Internal("pending request abandoned".into())),
        }
    }
}

/// Table of pending requests, exclusively owning their completion handles.
pub struct CorrelationTable {
    pending: DashMap<String, PendingSlot>,
    generator: Box<IdGenerator>,
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::with_generator(Box::new(id::generate))
    }

    /// Table with an injected id source (tests stub this to force
    /// collisions).
    pub fn with_generator(generator: Box<IdGenerator>) -> Self {
        Self {
            pending: DashMap::new(),
            generator,
        }
    }

    pub fn generate_id(&self) -> String {
        (self.generator)()
    }

    /// Create the pending entry for `id`. Fails with `Collision` when the
    /// id already has one; the caller must not transmit in that case.
    pub fn register(&self, id: &str) -> Result<PendingRequest> {
        match self.pending.entry(id.to_string()) {
            Entry::Occupied(_) => Err(WsLoomError::Collision { id: id.to_string() }),
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                slot.insert(PendingSlot { tx, timer: None });
                Ok(PendingRequest { rx })
            }
        }
    }

    /// Attach the timeout timer's abort handle for best-effort cancel on
    /// completion. Aborts immediately when the entry already resolved.
    pub fn arm_timeout(&self, id: &str, timer: AbortHandle) {
        match self.pending.get_mut(id) {
            Some(mut slot) => slot.timer = Some(timer),
            None => timer.abort(),
        }
    }

    /// Complete the pending entry with a matching response envelope.
    /// `UnknownId` is a protocol anomaly for the caller to report, not a
    /// session-fatal condition.
    pub fn resolve(&self, id: &str, envelope: Envelope) -> Result<()> {
        match self.pending.remove(id) {
            Some((_, slot)) => {
                slot.complete(Ok(envelope));
                Ok(())
            }
            None => Err(WsLoomError::UnknownId { id: id.to_string() }),
        }
    }

    /// Complete the pending entry with a local failure (send-failed path).
    pub fn fail(&self, id: &str, error: WsLoomError) {
        if let Some((_, slot)) = self.pending.remove(id) {
            slot.complete(Err(error));
        }
    }

    /// Timer path: completes with `Timeout` if still pending, no-op if the
    /// entry already resolved (first writer wins).
    pub fn expire(&self, id: &str) {
        if let Some((_, slot)) = self.pending.remove(id) {
            slot.complete(Err(WsLoomError::Timeout));
        }
    }

    /// Drop the pending entry without delivering an outcome (the caller
    /// still holds the failure to return directly).
    pub fn discard(&self, id: &str) {
        if let Some((_, slot)) = self.pending.remove(id) {
            if let Some(timer) = slot.timer {
                timer.abort();
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
