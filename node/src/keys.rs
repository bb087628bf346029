//! The node's validator identity.

use stakenet_store::ChainStore;
use stakenet_types::{KeyPair, PrivateKey};

use crate::NodeError;

/// Load the node key from `store`, generating and persisting a fresh one on
/// first start.
pub fn load_or_create_keypair(store: &dyn ChainStore) -> Result<KeyPair, NodeError> {
    match store.get_wallet_key() {
        Ok(bytes) => {
            let private: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                NodeError::InvalidKey(format!("expected 32 bytes, found {}", bytes.len()))
            })?;
            let keys = stakenet_crypto::keypair_from_private(PrivateKey(private));
            tracing::info!(public_key = %keys.public.short(), "loaded node key");
            Ok(keys)
        }
        Err(e) if e.is_not_found() => {
            let keys = stakenet_crypto::generate_keypair();
            store.put_wallet_key(&keys.private.0)?;
            tracing::info!(public_key = %keys.public.short(), "generated new node key");
            Ok(keys)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakenet_nullables::NullStore;

    #[test]
    fn test_key_is_created_once() {
        let store = NullStore::new();
        let first = load_or_create_keypair(&store).unwrap();
        let second = load_or_create_keypair(&store).unwrap();
        assert_eq!(first.public, second.public);
    }

    #[test]
    fn test_truncated_key_is_rejected() {
        let store = NullStore::new();
        store.put_wallet_key(&[1; 16]).unwrap();
        assert!(matches!(load_or_create_keypair(&store), Err(NodeError::InvalidKey(_))));
    }

    #[test]
    fn test_write_failure_propagates() {
        let store = NullStore::new();
        store.fail_writes(true);
        assert!(matches!(load_or_create_keypair(&store), Err(NodeError::Store(_))));
    }
}
