//! WebSocket connector (tokio-tungstenite).
//!
//! Splits the stream into writer/reader tasks bridged by channels:
//! - writer drains the outbound queue into the sink, closing the socket
//!   when the queue's senders are gone;
//! - reader forwards text frames and surfaces errors, emitting exactly one
//!   `Closed` at the end. Ping/pong is handled by the library.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use wsloom_core::error::{Result, WsLoomError};

use crate::transport::session::{Connector, SessionEvent, TransportSession};

/// Production connector.
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<TransportSession> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| WsLoomError::ConnectFailed(format!("{url}: {e}")))?;

        let (mut sink, mut source) = stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<SessionEvent>();

        tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            // Session dropped or sink broken: close the socket so the
            // reader observes the end of the stream.
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            loop {
                match source.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if event_tx.send(SessionEvent::Message(text)).is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        let _ = event_tx.send(SessionEvent::Closed);
                        break;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::warn!("ignoring unexpected binary frame");
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let _ = event_tx.send(SessionEvent::Error(e.to_string()));
                        let _ = event_tx.send(SessionEvent::Closed);
                        break;
                    }
                }
            }
        });

        Ok(TransportSession::from_parts(out_tx, event_rx))
    }
}
