//! Read-once session-expiry marker.
//!
//! The reconnection path persists this flag when a session-expired failure
//! is escalated; the application bootstrap reads it exactly once (and
//! clears it) to present the logged-out state instead of retrying.

use std::fs;
use std::path::PathBuf;

use wsloom_core::error::{Result, WsLoomError};

pub struct ExpiryMarker {
    path: PathBuf,
}

impl ExpiryMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Persist the marker.
    pub fn set(&self) -> Result<()> {
        fs::write(&self.path, b"expired\n")
            .map_err(|e| WsLoomError::Internal(format!("write expiry marker failed: {e}")))
    }

    /// Read and clear. Returns whether the marker was present.
    pub fn take(&self) -> bool {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                tracing::warn!(error = %e, "failed to clear expiry marker");
            }
            true
        } else {
            false
        }
    }

    pub fn is_set(&self) -> bool {
        self.path.exists()
    }
}
