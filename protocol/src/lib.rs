//! Wire protocol: text framing, encoding/decoding, connection handshake.

pub mod codec;
pub mod error;
pub mod handshake;

pub use codec::{decode, encode, MAX_MESSAGE_SIZE};
pub use error::ProtocolError;
pub use handshake::handshake_messages;
