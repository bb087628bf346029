//! Nullable store — thread-safe in-memory storage for testing.

use stakenet_store::{ChainStore, StoreError, CHAIN_KEY, WALLET_KEY};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// An in-memory chain + key store for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Debug, Default)]
pub struct NullStore {
    chain: Mutex<Option<Vec<u8>>>,
    wallet_key: Mutex<Option<Vec<u8>>>,
    fail_writes: AtomicBool,
    chain_writes: AtomicUsize,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent put fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful chain writes so far.
    pub fn chain_writes(&self) -> usize {
        self.chain_writes.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("writes disabled".into()));
        }
        Ok(())
    }
}

impl ChainStore for NullStore {
    fn get_chain(&self) -> Result<Vec<u8>, StoreError> {
        self.chain
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| StoreError::NotFound(CHAIN_KEY.into()))
    }

    fn put_chain(&self, chain: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        *self.chain.lock().unwrap() = Some(chain.to_vec());
        self.chain_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get_wallet_key(&self) -> Result<Vec<u8>, StoreError> {
        self.wallet_key
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| StoreError::NotFound(WALLET_KEY.into()))
    }

    fn put_wallet_key(&self, key: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        *self.wallet_key.lock().unwrap() = Some(key.to_vec());
        Ok(())
    }
}
