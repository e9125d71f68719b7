//! Wire envelope (JSON).
//!
//! One envelope per frame, except inbound frames may carry a `batch` array
//! of envelopes; batch order is processing order (no reordering, no
//! deduplication).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WsLoomError};

/// Closed set of envelope kinds; dispatch is a `match`, never a string
/// lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Request,
    Response,
    Push,
}

/// One logical message unit exchanged over the transport.
///
/// Unknown fields on inbound frames are ignored rather than rejected, so
/// forward-compatible server additions cannot drop an otherwise-valid
/// response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Correlation id; required on requests, echoed on matching responses,
    /// absent on pure push messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Envelope kind (field name is `type` in JSON).
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    /// Payload schema tag; opaque to the transport layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Arbitrary structured data, semantics owned by callers.
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    /// Build a request envelope.
    pub fn request(id: String, subtype: &str, payload: Value) -> Self {
        Self {
            id: Some(id),
            msg_type: MessageType::Request,
            subtype: Some(subtype.to_string()),
            payload,
        }
    }

    /// Parse the payload as a response payload (`{success, data?, error?}`).
    pub fn response_payload(&self) -> Result<ResponsePayload> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| WsLoomError::BadFrame(format!("invalid response payload: {e}")))
    }
}

/// Response payload shape: success flag plus either data or error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

/// Decoded inbound frame: a single envelope or an ordered batch.
#[derive(Debug)]
pub enum Inbound {
    Single(Envelope),
    Batch(Vec<Envelope>),
}

impl Inbound {
    /// Flatten to an ordered list for dispatch.
    pub fn into_envelopes(self) -> Vec<Envelope> {
        match self {
            Inbound::Single(env) => vec![env],
            Inbound::Batch(envs) => envs,
        }
    }
}

#[derive(Deserialize)]
struct BatchFrame {
    batch: Vec<Envelope>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Frame {
    Batch(BatchFrame),
    Single(Envelope),
}

/// Serialize an envelope to wire text.
pub fn encode(env: &Envelope) -> Result<String> {
    serde_json::to_string(env)
        .map_err(|e| WsLoomError::Serialization(format!("envelope encode failed: {e}")))
}

/// Parse an inbound text frame, preserving batch order.
pub fn decode(text: &str) -> Result<Inbound> {
    let frame: Frame = serde_json::from_str(text)
        .map_err(|e| WsLoomError::BadFrame(format!("invalid envelope json: {e}")))?;
    Ok(match frame {
        Frame::Batch(b) => Inbound::Batch(b.batch),
        Frame::Single(env) => Inbound::Single(env),
    })
}
