//! Transport layer: one socket-like connection per session instance.

pub mod session;
pub mod ws;

pub use session::{Connector, SessionEvent, TransportSession};
pub use ws::WsConnector;
