//! Timer interface trait
//!
//! Provides a monotonic clock plus blocking delays. All deadline
//! handling in the core is built on `now_us` via [`crate::core::timing::Deadline`]
//! rather than ad hoc time arithmetic.

use crate::platform::Result;

/// Timer peripheral interface
pub trait TimerInterface {
    /// Block for `us` microseconds
    fn delay_us(&mut self, us: u32) -> Result<()>;

    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32) -> Result<()>;

    /// Monotonic time since boot in microseconds
    fn now_us(&self) -> u64;

    /// Monotonic time since boot in milliseconds
    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }
}
