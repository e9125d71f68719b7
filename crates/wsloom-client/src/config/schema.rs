use serde::Deserialize;
use wsloom_core::error::{Result, WsLoomError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub origin: OriginSection,

    #[serde(default)]
    pub connection: ConnectionSection,

    #[serde(default)]
    pub reconnect: ReconnectSection,

    #[serde(default)]
    pub handshake: HandshakeSection,

    #[serde(default)]
    pub session: SessionSection,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(WsLoomError::Config("version must be 1".into()));
        }
        self.origin.validate()?;
        self.connection.validate()?;
        self.reconnect.validate()?;
        Ok(())
    }
}

/// Hosting origin the endpoint is derived from. The server is assumed
/// reachable at the same host, differing only by port.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OriginSection {
    #[serde(default = "default_host")]
    pub host: String,

    /// `true` selects the `wss` scheme.
    #[serde(default)]
    pub secure: bool,
}

impl Default for OriginSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            secure: false,
        }
    }
}

impl OriginSection {
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(WsLoomError::Config("origin.host must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSection {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            path: default_path(),
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

impl ConnectionSection {
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(WsLoomError::Config("connection.port must not be 0".into()));
        }
        if !self.path.starts_with('/') {
            return Err(WsLoomError::Config(
                "connection.path must start with '/'".into(),
            ));
        }
        if !(1_000..=600_000).contains(&self.response_timeout_ms) {
            return Err(WsLoomError::Config(
                "connection.response_timeout_ms must be between 1000 and 600000".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectSection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_seconds_increment")]
    pub seconds_increment: u32,
}

impl Default for ReconnectSection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            seconds_increment: default_seconds_increment(),
        }
    }
}

impl ReconnectSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.max_attempts) {
            return Err(WsLoomError::Config(
                "reconnect.max_attempts must be between 1 and 100".into(),
            ));
        }
        if !(1..=300).contains(&self.seconds_increment) {
            return Err(WsLoomError::Config(
                "reconnect.seconds_increment must be between 1 and 300".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandshakeSection {
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u32,
}

impl Default for HandshakeSection {
    fn default() -> Self {
        Self {
            protocol_version: default_protocol_version(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSection {
    /// Where the read-once session-expiry marker is persisted.
    #[serde(default = "default_expiry_marker_path")]
    pub expiry_marker_path: String,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            expiry_marker_path: default_expiry_marker_path(),
        }
    }
}

fn default_host() -> String {
    "localhost".into()
}
fn default_port() -> u16 {
    8001
}
fn default_path() -> String {
    "/".into()
}
fn default_response_timeout_ms() -> u64 {
    60_000
}
fn default_max_attempts() -> u32 {
    10
}
fn default_seconds_increment() -> u32 {
    5
}
fn default_protocol_version() -> u32 {
    1
}
fn default_expiry_marker_path() -> String {
    ".wsloom-session-expired".into()
}
