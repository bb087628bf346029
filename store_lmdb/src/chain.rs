//! LMDB implementation of ChainStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use stakenet_store::{ChainStore, StoreError, CHAIN_KEY, WALLET_KEY};

use crate::LmdbError;

pub struct LmdbChainStore {
    pub(crate) env: Arc<Env>,
    pub(crate) node_db: Database<Bytes, Bytes>,
}

impl LmdbChainStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        self.node_db.put(&mut wtxn, key.as_bytes(), value)?;
        wtxn.commit()?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let val = self
            .node_db
            .get(&rtxn, key.as_bytes())?
            .ok_or_else(|| LmdbError::NotFound(key.to_string()))?;
        Ok(val.to_vec())
    }
}

impl ChainStore for LmdbChainStore {
    fn get_chain(&self) -> Result<Vec<u8>, StoreError> {
        Ok(self.get(CHAIN_KEY)?)
    }

    fn put_chain(&self, chain: &[u8]) -> Result<(), StoreError> {
        Ok(self.put(CHAIN_KEY, chain)?)
    }

    fn get_wallet_key(&self) -> Result<Vec<u8>, StoreError> {
        Ok(self.get(WALLET_KEY)?)
    }

    fn put_wallet_key(&self, key: &[u8]) -> Result<(), StoreError> {
        Ok(self.put(WALLET_KEY, key)?)
    }
}
