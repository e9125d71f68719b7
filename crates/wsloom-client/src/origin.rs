//! Endpoint URL construction from the hosting origin.
//!
//! The scheme follows the hosting origin's security (`wss` when secure,
//! `ws` otherwise) and the host is reused as-is; only the port and path are
//! fixed by configuration.

use crate::config::schema::{ClientConfig, OriginSection};

/// Hosting origin: host plus whether it is served securely.
#[derive(Debug, Clone)]
pub struct Origin {
    pub host: String,
    pub secure: bool,
}

impl Origin {
    pub fn new(host: impl Into<String>, secure: bool) -> Self {
        Self {
            host: host.into(),
            secure,
        }
    }

    pub fn from_config(section: &OriginSection) -> Self {
        Self::new(section.host.clone(), section.secure)
    }

    /// Build the WebSocket endpoint URL for a fixed port and path.
    pub fn endpoint_url(&self, port: u16, path: &str) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{scheme}://{}:{port}{path}", self.host)
    }
}

/// Endpoint URL for a full client config.
pub fn endpoint_from_config(cfg: &ClientConfig) -> String {
    Origin::from_config(&cfg.origin).endpoint_url(cfg.connection.port, &cfg.connection.path)
}
