//! Stake management for validator eligibility.
//!
//! The [`StakeManager`] holds one [`StakeRecord`] per validator key. A record
//! becomes active once its bond has matured, and only active validators take
//! part in leader election and may propose blocks.

pub mod error;
pub mod manager;
pub mod record;

pub use error::StakeError;
pub use manager::{ActiveValidator, StakeManager};
pub use record::{StakeInfo, StakeRecord};
