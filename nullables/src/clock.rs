//! Nullable clock — deterministic time for testing.

use stakenet_types::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic millisecond clock for testing.
///
/// Time only advances when you tell it to.
#[derive(Debug, Default)]
pub struct NullClock {
    current: AtomicU64,
}

impl NullClock {
    pub fn new(initial_ms: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_ms),
        }
    }

    /// Get the current time.
    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.current.load(Ordering::SeqCst))
    }

    /// Advance time by a number of milliseconds and return the new time.
    pub fn advance(&self, ms: u64) -> Timestamp {
        Timestamp::new(self.current.fetch_add(ms, Ordering::SeqCst) + ms)
    }

    /// Set the time to a specific value.
    pub fn set(&self, ms: u64) {
        self.current.store(ms, Ordering::SeqCst);
    }
}
