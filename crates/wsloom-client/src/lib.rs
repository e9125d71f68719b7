//! wsLoom client library entry.
//!
//! This crate wires the transport session, correlation table, request
//! engine, and reconnection controller into a cohesive client stack. It is
//! intended to be consumed by the probe binary (`main.rs`) and by
//! integration tests.

pub mod client;
pub mod config;
pub mod correlation;
pub mod engine;
pub mod expiry;
pub mod origin;
pub mod reconnect;
pub mod transport;
