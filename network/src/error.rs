use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("connection to {address} failed: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("peer directory error: {0}")]
    Directory(String),

    #[error("directory unreachable: {0}")]
    Unreachable(String),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] stakenet_protocol::ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
