use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stakenet_crypto::{hash_transaction, sign_message, verify_signature};
use stakenet_types::{KeyPair, PublicKey, Signature, Timestamp, TxHash};

use crate::error::TransactionError;

/// A reading submitted for inclusion, before it is signed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor_id: String,
    pub reading: Value,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// The signature envelope of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub timestamp: Timestamp,
    /// The signer's public key.
    pub address: PublicKey,
    pub signature: Signature,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// 16 random bytes, hex encoded.
    pub id: String,
    pub timestamp: Timestamp,
    pub sensor_id: String,
    pub reading: Value,
    #[serde(default)]
    pub metadata: Option<Value>,
    pub hash: TxHash,
    pub input: TransactionInput,
}

/// The fields covered by the transaction hash, in hashing order.
#[derive(Serialize)]
struct SignablePayload<'a> {
    id: &'a str,
    timestamp: Timestamp,
    sensor_id: &'a str,
    reading: &'a Value,
    metadata: &'a Option<Value>,
}

fn new_transaction_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl Transaction {
    /// Build and sign a transaction for `reading` with a fresh random id.
    pub fn from_sensor_reading(
        keys: &KeyPair,
        reading: SensorReading,
        now: Timestamp,
    ) -> Result<Self, TransactionError> {
        Self::signed(keys, new_transaction_id(), reading, now)
    }

    /// Build and sign a transaction with a caller-chosen id. Resubmitting
    /// under an existing id replaces the pending entry.
    pub fn signed(
        keys: &KeyPair,
        id: String,
        reading: SensorReading,
        now: Timestamp,
    ) -> Result<Self, TransactionError> {
        let SensorReading {
            sensor_id,
            reading,
            metadata,
        } = reading;
        let hash = payload_hash(&id, now, &sensor_id, &reading, &metadata)?;
        Ok(Self {
            id,
            timestamp: now,
            sensor_id,
            reading,
            metadata,
            input: TransactionInput {
                timestamp: now,
                address: keys.public.clone(),
                signature: sign_message(hash.as_bytes(), &keys.private),
            },
            hash,
        })
    }

    /// Recompute the hash of the signable payload.
    pub fn compute_hash(&self) -> Result<TxHash, TransactionError> {
        payload_hash(
            &self.id,
            self.timestamp,
            &self.sensor_id,
            &self.reading,
            &self.metadata,
        )
    }

    /// Check the transaction is fit for inclusion in a block.
    pub fn validate(&self) -> Result<(), TransactionError> {
        if self.sensor_id.is_empty() {
            return Err(TransactionError::MissingSensor {
                id: self.id.clone(),
            });
        }
        check_reading(&self.reading).map_err(|reason| TransactionError::MalformedReading {
            id: self.id.clone(),
            reason,
        })?;
        if self.compute_hash()? != self.hash {
            return Err(TransactionError::HashMismatch {
                id: self.id.clone(),
            });
        }
        if !verify_signature(self.hash.as_bytes(), &self.input.signature, &self.input.address) {
            return Err(TransactionError::InvalidSignature {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

fn payload_hash(
    id: &str,
    timestamp: Timestamp,
    sensor_id: &str,
    reading: &Value,
    metadata: &Option<Value>,
) -> Result<TxHash, TransactionError> {
    let payload = serde_json::to_vec(&SignablePayload {
        id,
        timestamp,
        sensor_id,
        reading,
        metadata,
    })?;
    Ok(hash_transaction(&payload))
}

/// A reading must be an object whose `value` is present and not null,
/// `false` or an empty string.
fn check_reading(reading: &Value) -> Result<(), &'static str> {
    let Some(object) = reading.as_object() else {
        return Err("reading is not an object");
    };
    match object.get("value") {
        None | Some(Value::Null) => Err("reading has no value"),
        Some(Value::Bool(false)) => Err("reading value is false"),
        Some(Value::String(s)) if s.is_empty() => Err("reading value is empty"),
        Some(_) => Ok(()),
    }
}
