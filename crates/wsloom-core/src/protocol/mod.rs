//! Protocol modules (JSON envelopes + correlation ids).
//!
//! The wire format is JSON text frames carrying one envelope each, except
//! that the server may group several envelopes in a `{"batch": [...]}`
//! frame. Parsing is panic-free: malformed input is reported as
//! `WsLoomError::BadFrame` instead of panicking, keeping the session
//! resilient to protocol anomalies.

pub mod envelope;
pub mod id;

pub use envelope::{decode, encode, Envelope, Inbound, MessageType, ResponsePayload};
