//! Reconnection controller.
//!
//! One task drives the whole lifecycle: it rests until a connection-lost
//! notification arrives, then runs a cycle of attempts with linearly
//! growing waits (`attempt * seconds_increment`) until one succeeds, the
//! attempt limit is exhausted (manual retry only from there), or the
//! failure escalates to session invalidation. Recovery counts only after
//! the rehandshake, not at socket-open.

pub mod state;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;

use wsloom_core::error::{Result, WsLoomError};

use crate::config::schema::ReconnectSection;

pub use state::{ReconnectState, ReconnectStatus};

/// Commands accepted by the controller task.
#[derive(Debug)]
pub enum ReconnectCommand {
    /// The current transport session closed unexpectedly.
    ConnectionLost,
    /// Explicit user action: attempt now, bypassing any pending wait.
    RetryNow,
}

/// What the controller drives: one full reconnection attempt is a
/// transport open plus rehandshake.
#[async_trait]
pub trait ReconnectTarget: Send + Sync {
    async fn attempt(&self) -> Result<()>;
    /// Escalation hook for the authorization-flavored failure; called
    /// instead of scheduling another attempt.
    async fn escalate_session_expiry(&self);
}

/// Cheap handle for collaborators: command injection + status snapshots.
#[derive(Clone)]
pub struct ReconnectHandle {
    cmd_tx: mpsc::UnboundedSender<ReconnectCommand>,
    status_rx: watch::Receiver<ReconnectStatus>,
}

impl ReconnectHandle {
    pub fn connection_lost(&self) {
        let _ = self.cmd_tx.send(ReconnectCommand::ConnectionLost);
    }

    pub fn retry_now(&self) {
        let _ = self.cmd_tx.send(ReconnectCommand::RetryNow);
    }

    pub fn status(&self) -> watch::Receiver<ReconnectStatus> {
        self.status_rx.clone()
    }
}

/// Spawn the controller task.
pub fn spawn(cfg: ReconnectSection, target: Arc<dyn ReconnectTarget>) -> ReconnectHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(ReconnectStatus::idle());
    tokio::spawn(run(cfg, target, cmd_rx, status_tx));
    ReconnectHandle { cmd_tx, status_rx }
}

async fn run(
    cfg: ReconnectSection,
    target: Arc<dyn ReconnectTarget>,
    mut cmd_rx: mpsc::UnboundedReceiver<ReconnectCommand>,
    status_tx: watch::Sender<ReconnectStatus>,
) {
    loop {
        // Resting until something happens; a manual retry while resting is
        // treated like a fresh cycle as well.
        if cmd_rx.recv().await.is_none() {
            return;
        }
        run_cycle(&cfg, target.as_ref(), &mut cmd_rx, &status_tx).await;
    }
}

fn publish(
    status_tx: &watch::Sender<ReconnectStatus>,
    state: ReconnectState,
    attempt: u32,
    countdown_secs: u32,
) {
    let _ = status_tx.send_replace(ReconnectStatus {
        state,
        attempt,
        countdown_secs,
    });
}

/// One reconnection cycle, from `init` to `closed`.
async fn run_cycle(
    cfg: &ReconnectSection,
    target: &dyn ReconnectTarget,
    cmd_rx: &mut mpsc::UnboundedReceiver<ReconnectCommand>,
    status_tx: &watch::Sender<ReconnectStatus>,
) {
    let mut attempt: u32 = 0;
    publish(status_tx, ReconnectState::Init, attempt, 0);

    loop {
        publish(status_tx, ReconnectState::Connecting, attempt, 0);
        match target.attempt().await {
            Ok(()) => {
                tracing::info!(attempt, "connection recovered");
                publish(status_tx, ReconnectState::Closed, attempt, 0);
                return;
            }
            Err(WsLoomError::SessionExpired) => {
                tracing::warn!("session expired; abandoning reconnection");
                target.escalate_session_expiry().await;
                publish(status_tx, ReconnectState::Closed, attempt, 0);
                return;
            }
            Err(err) => {
                tracing::warn!(attempt, error = %err, "reconnection attempt failed");
                publish(status_tx, ReconnectState::Error, attempt, 0);
            }
        }

        if attempt >= cfg.max_attempts {
            publish(status_tx, ReconnectState::Timeout, attempt, 0);
            // Automatic scheduling stops here. A manual trigger re-enters
            // connecting without incrementing past max; further
            // connection-lost notifications change nothing.
            loop {
                match cmd_rx.recv().await {
                    None => return,
                    Some(ReconnectCommand::RetryNow) => break,
                    Some(ReconnectCommand::ConnectionLost) => {}
                }
            }
            continue;
        }

        attempt += 1;
        let mut remaining = attempt * cfg.seconds_increment;
        publish(status_tx, ReconnectState::Waiting, attempt, remaining);

        'countdown: loop {
            tokio::select! {
                _ = sleep(Duration::from_secs(1)) => {
                    remaining -= 1;
                    publish(status_tx, ReconnectState::Waiting, attempt, remaining);
                    if remaining == 0 {
                        break 'countdown;
                    }
                }
                cmd = cmd_rx.recv() => match cmd {
                    None => return,
                    // Cancel the pending wait so the manual attempt cannot
                    // be duplicated by the timer.
                    Some(ReconnectCommand::RetryNow) => break 'countdown,
                    Some(ReconnectCommand::ConnectionLost) => {}
                }
            }
        }
    }
}
