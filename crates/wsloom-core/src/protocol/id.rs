//! Correlation-id generation (UUID v4).

use uuid::{Builder, Uuid};

/// Generate a fresh v4 correlation id.
pub fn generate() -> String {
    Uuid::new_v4().to_string()
}

/// Shape arbitrary bytes into a v4-formed id.
///
/// Version and variant bits are forced per RFC 4122 §4.4, whatever the
/// quality of the source bytes.
pub fn from_random_bytes(bytes: [u8; 16]) -> String {
    Builder::from_random_bytes(bytes).into_uuid().to_string()
}
