use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    #[error("failed to create data directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("key not found: {0}")]
    NotFound(String),
}

impl From<LmdbError> for stakenet_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::NotFound(key) => stakenet_store::StoreError::NotFound(key),
            other => stakenet_store::StoreError::Backend(other.to_string()),
        }
    }
}
