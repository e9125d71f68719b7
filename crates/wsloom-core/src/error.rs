//! Shared error type across wsLoom crates.

use serde_json::json;
use thiserror::Error;

/// Stable failure codes surfaced to callers (wire-stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCode {
    /// Generated id already has a pending entry.
    Collision,
    /// Response referenced an id with no pending entry.
    UnknownId,
    /// No response within the configured timeout.
    Timeout,
    /// Transport refused the frame at transmit time.
    SendFailed,
    /// Connection could not be established.
    ConnectFailed,
    /// No usable connection (e.g. a reconnection cycle is in progress).
    ConnectionUnavailable,
    /// Authorization-flavored failure; session must be invalidated.
    SessionExpired,
    /// Payload not encodable.
    Serialization,
    /// Server rejected the handshake.
    HandshakeRejected,
    /// Inbound frame not decodable as an envelope or batch.
    BadFrame,
    /// Invalid configuration.
    Config,
    /// Internal error.
    Internal,
}

impl FailureCode {
    /// String representation used in failure payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCode::Collision => "collision",
            FailureCode::UnknownId => "unknown-id",
            FailureCode::Timeout => "timeout",
            FailureCode::SendFailed => "send-failed",
            FailureCode::ConnectFailed => "connect-failed",
            FailureCode::ConnectionUnavailable => "connection-unavailable",
            FailureCode::SessionExpired => "session-expired",
            FailureCode::Serialization => "serialization",
            FailureCode::HandshakeRejected => "handshake-rejected",
            FailureCode::BadFrame => "bad-frame",
            FailureCode::Config => "config",
            FailureCode::Internal => "internal",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, WsLoomError>;

/// Unified error type used by core and the client runtime.
///
/// Per-request failures are returned as `Err` values from the operation's
/// future so calling code must branch on the outcome; nothing in the
/// dispatch path throws its way out of the session.
#[derive(Debug, Error)]
pub enum WsLoomError {
    #[error("id collision: {id}")]
    Collision { id: String },
    #[error("no pending request for id: {id}")]
    UnknownId { id: String },
    #[error("response timed out")]
    Timeout,
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("connect failed: {0}")]
    ConnectFailed(String),
    #[error("connection unavailable")]
    ConnectionUnavailable,
    #[error("session expired")]
    SessionExpired,
    #[error("serialization failed: {0}")]
    Serialization(String),
    #[error("handshake rejected: {0}")]
    HandshakeRejected(serde_json::Value),
    #[error("bad frame: {0}")]
    BadFrame(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl WsLoomError {
    /// Map to a stable failure code.
    pub fn failure_code(&self) -> FailureCode {
        match self {
            WsLoomError::Collision { .. } => FailureCode::Collision,
            WsLoomError::UnknownId { .. } => FailureCode::UnknownId,
            WsLoomError::Timeout => FailureCode::Timeout,
            WsLoomError::SendFailed(_) => FailureCode::SendFailed,
            WsLoomError::ConnectFailed(_) => FailureCode::ConnectFailed,
            WsLoomError::ConnectionUnavailable => FailureCode::ConnectionUnavailable,
            WsLoomError::SessionExpired => FailureCode::SessionExpired,
            WsLoomError::Serialization(_) => FailureCode::Serialization,
            WsLoomError::HandshakeRejected(_) => FailureCode::HandshakeRejected,
            WsLoomError::BadFrame(_) => FailureCode::BadFrame,
            WsLoomError::Config(_) => FailureCode::Config,
            WsLoomError::Internal(_) => FailureCode::Internal,
        }
    }

    /// Structured failure object: `{"error": <code>, "details": {..}}`.
    ///
    /// Details are attached only where the failure carries context the
    /// caller can act on (the colliding id, the transport's error text).
    pub fn failure_payload(&self) -> serde_json::Value {
        let code = self.failure_code().as_str();
        match self {
            WsLoomError::Collision { id } => {
                json!({ "error": code, "details": { "id": id } })
            }
            WsLoomError::UnknownId { id } => {
                json!({ "error": code, "details": { "id": id } })
            }
            WsLoomError::SendFailed(e) | WsLoomError::ConnectFailed(e) => {
                json!({ "error": code, "details": { "error": e } })
            }
            WsLoomError::HandshakeRejected(v) => {
                json!({ "error": code, "details": { "error": v } })
            }
            _ => json!({ "error": code }),
        }
    }
}
