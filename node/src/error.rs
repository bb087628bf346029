use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("chain error: {0}")]
    Chain(#[from] stakenet_ledger::ChainError),

    #[error("block error: {0}")]
    Block(#[from] stakenet_ledger::BlockError),

    #[error("stake error: {0}")]
    Stake(#[from] stakenet_stake::StakeError),

    #[error("transaction error: {0}")]
    Transaction(#[from] stakenet_transactions::TransactionError),

    #[error("network error: {0}")]
    Network(#[from] stakenet_network::NetworkError),

    #[error("protocol error: {0}")]
    Protocol(#[from] stakenet_protocol::ProtocolError),

    #[error("store error: {0}")]
    Store(#[from] stakenet_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] stakenet_store_lmdb::LmdbError),

    #[error("config error: {0}")]
    Config(String),

    #[error("stored node key is invalid: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("node task has stopped")]
    Stopped,
}
