//! Mock Timer implementation for testing

use crate::platform::{Result, traits::TimerInterface};

/// Mock Timer implementation
///
/// Uses simulated time: delays advance the clock instantly, and tests
/// can jump the clock forward with [`MockTimer::advance_ms`] to cross
/// interval and timeout boundaries without real waiting.
#[derive(Debug)]
pub struct MockTimer {
    now_us: u64,
}

impl MockTimer {
    /// Create a new mock timer at t = 0
    pub fn new() -> Self {
        Self { now_us: 0 }
    }

    /// Jump the simulated clock forward (for test setup)
    pub fn advance_ms(&mut self, ms: u64) {
        self.now_us = self.now_us.wrapping_add(ms * 1000);
    }
}

impl Default for MockTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerInterface for MockTimer {
    fn delay_us(&mut self, us: u32) -> Result<()> {
        self.now_us = self.now_us.wrapping_add(us as u64);
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) -> Result<()> {
        self.delay_us(ms.saturating_mul(1000))
    }

    fn now_us(&self) -> u64 {
        self.now_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_advances_clock() {
        let mut timer = MockTimer::new();
        assert_eq!(timer.now_us(), 0);

        timer.delay_us(1000).unwrap();
        assert_eq!(timer.now_us(), 1000);

        timer.delay_ms(2).unwrap();
        assert_eq!(timer.now_us(), 3000);
    }

    #[test]
    fn test_advance_ms_jumps_clock() {
        let mut timer = MockTimer::new();
        timer.advance_ms(60_000);
        assert_eq!(timer.now_ms(), 60_000);
    }
}
