//! Transport seam.
//!
//! The driver only ever hands text frames to a [`Transport`]; it never waits
//! on the socket. [`connect`] bridges a WebSocket to a pair of channels with
//! one reader and one writer task, so the session task that owns the driver
//! is the only place game state is touched.

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Outbound queue depth before sends start failing.
const OUTGOING_CAPACITY: usize = 64;
const INCOMING_CAPACITY: usize = 256;

/// Why a frame could not be handed to the transport. Both are recoverable
/// from the simulation's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("transport unavailable")]
    Unavailable,
    #[error("transport closed")]
    Closed,
}

/// Fire-and-forget outbound channel.
pub trait Transport {
    fn send(&mut self, text: String) -> Result<(), SendError>;
}

/// [`Transport`] over a bounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<String>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, text: String) -> Result<(), SendError> {
        self.tx.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Unavailable,
            TrySendError::Closed(_) => SendError::Closed,
        })
    }
}

/// In-memory transport for headless runs and tests.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    pub sent: Vec<String>,
    /// When set, every send fails with [`SendError::Unavailable`].
    pub offline: bool,
}

impl Transport for MemoryTransport {
    fn send(&mut self, text: String) -> Result<(), SendError> {
        if self.offline {
            return Err(SendError::Unavailable);
        }
        self.sent.push(text);
        Ok(())
    }
}

/// Creates the outbound queue: the transport half goes to the driver, the
/// receiver to [`connect`].
pub fn outgoing_channel() -> (ChannelTransport, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(OUTGOING_CAPACITY);
    (ChannelTransport::new(tx), rx)
}

/// Connects to `url` and spawns the reader/writer tasks. Frames queued on
/// `outgoing` are written to the socket; inbound text frames come back on
/// the returned receiver.
pub async fn connect(
    url: &str,
    mut outgoing: mpsc::Receiver<String>,
) -> anyhow::Result<mpsc::Receiver<String>> {
    info!(url = %url, "Connecting to server");
    let (ws, _) = connect_async(url)
        .await
        .with_context(|| format!("websocket connect {url}"))?;
    info!("WebSocket connected");

    let (mut write, mut read) = ws.split();
    let (in_tx, in_rx) = mpsc::channel::<String>(INCOMING_CAPACITY);

    tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    if in_tx.send(text).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("Server closed connection");
                    break;
                }
                Ok(other) => debug!(?other, "Ignoring non-text frame"),
                Err(e) => {
                    warn!(error = %e, "WebSocket read error");
                    break;
                }
            }
        }
        debug!("Reader task ended");
    });

    tokio::spawn(async move {
        while let Some(text) = outgoing.recv().await {
            if let Err(e) = write.send(Message::Text(text)).await {
                warn!(error = %e, "WebSocket write error");
                break;
            }
        }
        let _ = write.close().await;
        debug!("Writer task ended");
    });

    Ok(in_rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_channel_is_unavailable() {
        let (tx, _rx) = mpsc::channel(1);
        let mut t = ChannelTransport::new(tx);
        assert_eq!(t.send("a".into()), Ok(()));
        assert_eq!(t.send("b".into()), Err(SendError::Unavailable));
    }

    #[test]
    fn dropped_receiver_is_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut t = ChannelTransport::new(tx);
        assert_eq!(t.send("a".into()), Err(SendError::Closed));
    }
}
