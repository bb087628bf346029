//! Message codec. One message per WebSocket text frame, JSON encoded.

use stakenet_messages::Message;

use crate::ProtocolError;

/// Maximum message size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024; // 16 MiB

/// Encode a message as a JSON text frame.
pub fn encode(message: &Message) -> Result<String, ProtocolError> {
    let text = serde_json::to_string(message).map_err(|e| ProtocolError::Encode(e.to_string()))?;
    check_size(text.len())?;
    Ok(text)
}

/// Decode a message from a text frame.
pub fn decode(data: &str) -> Result<Message, ProtocolError> {
    check_size(data.len())?;
    serde_json::from_str(data).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

fn check_size(size: usize) -> Result<(), ProtocolError> {
    if size > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size,
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let text = encode(&Message::RequestChain).unwrap();
        assert_eq!(text, r#"{"type":"REQUEST_CHAIN"}"#);
        assert_eq!(decode(&text).unwrap(), Message::RequestChain);
    }

    #[test]
    fn test_malformed_frame() {
        assert!(matches!(decode("{not json"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(decode(r#"{"type":"BLOCK"}"#), Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_oversized_frame() {
        let huge = " ".repeat(MAX_MESSAGE_SIZE + 1);
        assert!(matches!(decode(&huge), Err(ProtocolError::MessageTooLarge { .. })));
    }
}
