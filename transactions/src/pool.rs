//! Pending transactions awaiting inclusion in a block.

use std::collections::HashSet;

use stakenet_types::PublicKey;
use tracing::warn;

use crate::transaction::Transaction;

/// Pending transactions in arrival order, unique by id.
#[derive(Default)]
pub struct TransactionPool {
    transactions: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `tx`, replacing any pending transaction with the same id in
    /// place. Returns `true` if an entry was replaced.
    pub fn update_or_add(&mut self, tx: Transaction) -> bool {
        match self.transactions.iter_mut().find(|t| t.id == tx.id) {
            Some(existing) => {
                *existing = tx;
                true
            }
            None => {
                self.transactions.push(tx);
                false
            }
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The pending transactions fit for inclusion, in arrival order. Invalid
    /// entries are logged and left in the pool.
    pub fn valid_transactions(&self) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|tx| match tx.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!(id = %tx.id, signer = %tx.input.address.short(), error = %e, "skipping invalid transaction");
                    false
                }
            })
            .cloned()
            .collect()
    }

    /// The first pending transaction signed by `address`.
    pub fn existing_transaction(&self, address: &PublicKey) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| &tx.input.address == address)
    }

    /// Drop every pending transaction whose id appears in `confirmed`.
    /// Returns how many were removed.
    pub fn remove_confirmed<'a>(&mut self, confirmed: impl IntoIterator<Item = &'a Transaction>) -> usize {
        let ids: HashSet<&str> = confirmed.into_iter().map(|tx| tx.id.as_str()).collect();
        let before = self.transactions.len();
        self.transactions.retain(|tx| !ids.contains(tx.id.as_str()));
        before - self.transactions.len()
    }

    pub fn clear(&mut self) {
        self.transactions.clear();
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::SensorReading;
    use serde_json::json;
    use stakenet_crypto::keypair_from_seed;
    use stakenet_types::{KeyPair, Timestamp};

    fn keys() -> KeyPair {
        keypair_from_seed(&[8; 32])
    }

    fn tx(id: &str, value: f64) -> Transaction {
        let reading = SensorReading {
            sensor_id: "probe".into(),
            reading: json!({ "value": value }),
            metadata: None,
        };
        Transaction::signed(&keys(), id.into(), reading, Timestamp::new(10)).unwrap()
    }

    #[test]
    fn test_resubmission_replaces_entry() {
        let mut pool = TransactionPool::new();
        assert!(!pool.update_or_add(tx("a", 1.0)));
        assert!(!pool.update_or_add(tx("b", 2.0)));
        assert!(pool.update_or_add(tx("a", 3.0)));

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.transactions()[0].id, "a");
        assert_eq!(pool.transactions()[0].reading["value"], 3.0);
    }

    #[test]
    fn test_valid_transactions_filters_tampered() {
        let mut pool = TransactionPool::new();
        pool.update_or_add(tx("good", 1.0));
        let mut bad = tx("bad", 2.0);
        bad.reading = json!({ "value": 5.0 });
        pool.update_or_add(bad);

        let valid = pool.valid_transactions();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].id, "good");
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_remove_confirmed() {
        let mut pool = TransactionPool::new();
        pool.update_or_add(tx("a", 1.0));
        pool.update_or_add(tx("b", 2.0));
        pool.update_or_add(tx("c", 3.0));

        let confirmed = vec![tx("a", 1.0), tx("c", 9.0), tx("z", 0.5)];
        assert_eq!(pool.remove_confirmed(&confirmed), 2);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.transactions()[0].id, "b");
    }

    #[test]
    fn test_existing_transaction_by_signer() {
        let mut pool = TransactionPool::new();
        assert!(pool.existing_transaction(&keys().public).is_none());
        pool.update_or_add(tx("a", 1.0));
        assert_eq!(pool.existing_transaction(&keys().public).unwrap().id, "a");
    }

    #[test]
    fn test_clear() {
        let mut pool = TransactionPool::new();
        pool.update_or_add(tx("a", 1.0));
        pool.clear();
        assert!(pool.is_empty());
    }
}
