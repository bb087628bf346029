//! WebSocket listener and dialer.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::connection::{spawn_connection, ConnectionEvent, Direction, PeerId};
use crate::error::NetworkError;

/// Opens connections and hands them to the node as [`ConnectionEvent`]s.
///
/// Cheap to clone; every clone shares the same peer id counter and event
/// channel.
#[derive(Clone)]
pub struct Transport {
    events: mpsc::Sender<ConnectionEvent>,
    next_peer_id: Arc<AtomicU64>,
    queue_capacity: usize,
}

impl Transport {
    pub fn new(events: mpsc::Sender<ConnectionEvent>, queue_capacity: usize) -> Self {
        Self {
            events,
            next_peer_id: Arc::new(AtomicU64::new(1)),
            queue_capacity,
        }
    }

    fn allocate_id(&self) -> PeerId {
        self.next_peer_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Bind the P2P listener.
    pub async fn bind(addr: impl tokio::net::ToSocketAddrs) -> Result<TcpListener, NetworkError> {
        Ok(TcpListener::bind(addr).await?)
    }

    /// Accept connections on `listener` until the event channel closes.
    pub fn spawn_listener(&self, listener: TcpListener) -> JoinHandle<()> {
        let transport = self.clone();
        tokio::spawn(async move {
            loop {
                let (stream, remote) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        continue;
                    }
                };
                if transport.events.is_closed() {
                    break;
                }
                let transport = transport.clone();
                tokio::spawn(async move {
                    transport.accept(stream, remote).await;
                });
            }
        })
    }

    async fn accept(&self, stream: tokio::net::TcpStream, remote: SocketAddr) {
        match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => {
                let peer_id = self.allocate_id();
                tracing::debug!(peer_id, %remote, "inbound connection");
                spawn_connection(
                    peer_id,
                    remote.to_string(),
                    Direction::Inbound,
                    ws,
                    self.events.clone(),
                    self.queue_capacity,
                )
                .await;
            }
            Err(e) => {
                tracing::debug!(%remote, error = %e, "websocket handshake failed");
            }
        }
    }

    /// Connect to `address` (a `ws://` URL) and start its connection tasks.
    pub async fn dial(&self, address: &str) -> Result<PeerId, NetworkError> {
        let (ws, _response) = tokio_tungstenite::connect_async(address)
            .await
            .map_err(|e| NetworkError::ConnectionFailed {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        let peer_id = self.allocate_id();
        tracing::debug!(peer_id, address, "outbound connection");
        spawn_connection(
            peer_id,
            address.to_string(),
            Direction::Outbound,
            ws,
            self.events.clone(),
            self.queue_capacity,
        )
        .await;
        Ok(peer_id)
    }

    /// Dial in the background; a failure is reported as
    /// [`ConnectionEvent::DialFailed`].
    pub fn spawn_dial(&self, address: String) {
        let transport = self.clone();
        tokio::spawn(async move {
            if let Err(e) = transport.dial(&address).await {
                tracing::warn!(%address, error = %e, "dial failed");
                let _ = transport
                    .events
                    .send(ConnectionEvent::DialFailed { address })
                    .await;
            }
        });
    }
}
