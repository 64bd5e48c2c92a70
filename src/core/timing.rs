//! Deadline handling
//!
//! Every blocking wait in the core goes through [`Deadline`] instead of
//! manual time arithmetic. A deadline is created against the platform
//! timer and polled for expiry; expiry is the only cancellation
//! mechanism in the system.

use crate::platform::traits::TimerInterface;

/// A point in monotonic time after which a blocking operation must stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    end_us: u64,
}

impl Deadline {
    /// Create a deadline `ms` milliseconds from now
    pub fn after_ms<T: TimerInterface>(timer: &T, ms: u32) -> Self {
        Self {
            end_us: timer.now_us().saturating_add(ms as u64 * 1000),
        }
    }

    /// Return true once the deadline has passed
    pub fn expired<T: TimerInterface>(&self, timer: &T) -> bool {
        timer.now_us() >= self.end_us
    }

    /// Milliseconds remaining, zero if already expired
    pub fn remaining_ms<T: TimerInterface>(&self, timer: &T) -> u64 {
        self.end_us.saturating_sub(timer.now_us()) / 1000
    }
}
