use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("transaction {id} has no sensor id")]
    MissingSensor { id: String },

    #[error("transaction {id} has a malformed reading: {reason}")]
    MalformedReading { id: String, reason: &'static str },

    #[error("transaction {id} hash does not match its payload")]
    HashMismatch { id: String },

    #[error("invalid signature on transaction {id}")]
    InvalidSignature { id: String },

    #[error("failed to encode transaction payload: {0}")]
    Encoding(#[from] serde_json::Error),
}
