//! Top-level facade crate for wsLoom.
//!
//! Re-exports core types and the client library so users can depend on a single crate.

pub mod core {
    pub use wsloom_core::*;
}

pub mod client {
    pub use wsloom_client::*;
}
