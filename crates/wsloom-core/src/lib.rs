//! wsLoom core: transport-agnostic protocol primitives and error types.
//!
//! This crate defines the wire-level envelope contract, correlation-id
//! generation, and the error surface shared by the client runtime. It
//! intentionally carries no transport or runtime dependencies so it can be
//! reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `WsLoomError`/`Result` so a session
//! never goes down on malformed input or protocol anomalies.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, WsLoomError};
