use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StakeError {
    #[error("stake amount must be at least {minimum}, got {amount}")]
    BelowMinimum { amount: u64, minimum: u64 },

    #[error("no active stake found for validator")]
    NoActiveStake,

    #[error("withdrawal of {requested} exceeds staked amount {available}")]
    InsufficientStake { requested: u64, available: u64 },
}
