//! Failure-code / failure-payload mapping tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use wsloom_core::WsLoomError;

#[test]
fn collision_payload_carries_id() {
    let err = WsLoomError::Collision { id: "X".into() };
    let p = err.failure_payload();
    assert_eq!(p["error"], "collision");
    assert_eq!(p["details"]["id"], "X");
}

#[test]
fn send_failed_payload_carries_transport_error() {
    let err = WsLoomError::SendFailed("socket not open".into());
    let p = err.failure_payload();
    assert_eq!(p["error"], "send-failed");
    assert_eq!(p["details"]["error"], "socket not open");
}

#[test]
fn timeout_payload_has_no_details() {
    let p = WsLoomError::Timeout.failure_payload();
    assert_eq!(p["error"], "timeout");
    assert!(p.get("details").is_none());
}
