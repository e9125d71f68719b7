//! wsLoom probe client.
//!
//! Connects per `wsloom.yaml`, performs the handshake, then logs pushes
//! and reconnection transitions until interrupted.

use tracing_subscriber::{fmt, EnvFilter};

use wsloom_client::client::WsLoomClient;
use wsloom_client::config;

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = config::load_from_file("wsloom.yaml").expect("config load failed");
    let client = WsLoomClient::new(cfg);

    if client.session_was_expired() {
        tracing::warn!("previous session expired; marker cleared");
    }

    let data = client
        .init_connection()
        .await
        .expect("initial connection failed");
    tracing::info!(handshake = %data, "connected");

    let mut pushes = client.subscribe_push();
    let mut status = client.reconnect_status();

    loop {
        tokio::select! {
            push = pushes.recv() => match push {
                Ok(env) => tracing::info!(payload = %env.payload, "push"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(missed = n, "push subscription lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let s = status.borrow().clone();
                tracing::info!(
                    state = s.state.as_str(),
                    attempt = s.attempt,
                    countdown = s.countdown_secs,
                    "reconnector",
                );
            }
            _ = tokio::signal::ctrl_c() => {
                client.close();
                break;
            }
        }
    }
}
