use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VrfError {
    #[error("malformed proof: {0}")]
    Malformed(String),

    #[error("proof was produced by a different key")]
    KeyMismatch,

    #[error("proof does not commit to the expected seed")]
    SeedMismatch,

    #[error("proof signature does not verify")]
    BadSignature,
}
