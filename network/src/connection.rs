//! Per-connection reader and writer tasks.
//!
//! Every WebSocket connection, inbound or outbound, is split into two tasks:
//! a reader that decodes text frames and forwards them to the node as
//! [`ConnectionEvent::Message`], and a writer that drains a bounded outbound
//! queue of already-encoded frames. The node only ever holds the queue's
//! sender, so it never touches a socket directly.

use futures_util::{SinkExt, StreamExt};
use stakenet_messages::Message;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_tungstenite::WebSocketStream;

/// Process-local identifier for a live connection.
pub type PeerId = u64;

/// Which side opened the connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Lifecycle and traffic events reported by the transport to the node.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// A WebSocket handshake completed. `outbound` feeds the writer task.
    Connected {
        peer_id: PeerId,
        address: String,
        direction: Direction,
        outbound: mpsc::Sender<String>,
    },
    /// A decoded frame from a peer.
    Message { peer_id: PeerId, message: Message },
    /// The reader saw a close frame, an error, or end of stream.
    Disconnected { peer_id: PeerId },
    /// An outbound dial never got as far as a connection.
    DialFailed { address: String },
}

/// Split `stream` into reader and writer tasks and announce it to the node.
///
/// Returns `false` if the node's event channel is already closed, in which
/// case nothing is spawned and the stream is dropped.
pub async fn spawn_connection<S>(
    peer_id: PeerId,
    address: String,
    direction: Direction,
    stream: WebSocketStream<S>,
    events: mpsc::Sender<ConnectionEvent>,
    queue_capacity: usize,
) -> bool
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(queue_capacity.max(1));
    let (mut write, mut read) = stream.split();

    let connected = ConnectionEvent::Connected {
        peer_id,
        address: address.clone(),
        direction,
        outbound: outbound_tx,
    };
    if events.send(connected).await.is_err() {
        return false;
    }

    tokio::spawn(async move {
        while let Some(text) = outbound_rx.recv().await {
            if let Err(e) = write.send(Frame::Text(text)).await {
                tracing::debug!(peer_id, error = %e, "write failed, closing writer");
                break;
            }
        }
        let _ = write.close().await;
    });

    tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Frame::Text(text)) => match stakenet_protocol::decode(&text) {
                    Ok(message) => {
                        let event = ConnectionEvent::Message { peer_id, message };
                        if events.send(event).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(peer_id, %address, error = %e, "dropping undecodable frame");
                    }
                },
                Ok(Frame::Close(_)) => break,
                Ok(Frame::Binary(bytes)) => {
                    tracing::warn!(peer_id, len = bytes.len(), "dropping binary frame");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(peer_id, error = %e, "read failed");
                    break;
                }
            }
        }
        let _ = events.send(ConnectionEvent::Disconnected { peer_id }).await;
    });

    true
}
