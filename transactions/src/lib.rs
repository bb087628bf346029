//! Sensor-reading transactions and the pool of pending ones.
//!
//! A transaction carries one signed reading from a sensor. Validity is purely
//! structural plus cryptographic: a non-empty sensor id, a reading object with
//! a `value`, a hash matching the payload, and a signature by the submitter.

pub mod error;
pub mod pool;
pub mod transaction;

pub use error::TransactionError;
pub use pool::TransactionPool;
pub use transaction::{SensorReading, Transaction, TransactionInput};
