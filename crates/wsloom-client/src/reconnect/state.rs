//! Reconnection state machine vocabulary.

use serde::Serialize;

/// Discrete reconnection states.
///
/// `Closed` doubles as the resting state: reconnection finished
/// successfully or was abandoned, terminal for the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconnectState {
    /// A fresh cycle begins: attempt counter reset, first attempt starts.
    Init,
    /// An attempt is in flight.
    Connecting,
    /// Scheduled delay before the next attempt; countdown is visible.
    Waiting,
    /// Max attempts exhausted; only manual retry proceeds.
    Timeout,
    /// The last attempt failed, feeding into waiting or timeout.
    Error,
    /// Recovered or abandoned.
    Closed,
}

impl ReconnectState {
    pub fn as_str(self) -> &'static str {
        match self {
            ReconnectState::Init => "init",
            ReconnectState::Connecting => "connecting",
            ReconnectState::Waiting => "waiting",
            ReconnectState::Timeout => "timeout",
            ReconnectState::Error => "error",
            ReconnectState::Closed => "closed",
        }
    }
}

/// Snapshot published to subscribers after every transition and countdown
/// tick; a UI collaborator renders this directly.
#[derive(Debug, Clone, Serialize)]
pub struct ReconnectStatus {
    pub state: ReconnectState,
    /// Automatic attempts made in the current cycle.
    pub attempt: u32,
    /// Seconds until the next automatic attempt (meaningful in `Waiting`).
    pub countdown_secs: u32,
}

impl ReconnectStatus {
    pub fn idle() -> Self {
        Self {
            state: ReconnectState::Closed,
            attempt: 0,
            countdown_secs: 0,
        }
    }
}
