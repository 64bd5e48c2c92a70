//! Alert debouncing
//!
//! Prevents alert flooding: an over-limit speed sample raises at most
//! one alert per rolling debounce window. Samples inside the window are
//! counted but produce no message.

/// Speed alert debouncer
#[derive(Debug, Clone)]
pub struct SpeedAlarm {
    limit_kmh: f32,
    window_ms: u64,
    last_alert_ms: Option<u64>,
    suppressed: u32,
}

impl SpeedAlarm {
    pub fn new(limit_kmh: f32, window_ms: u64) -> Self {
        Self {
            limit_kmh,
            window_ms,
            last_alert_ms: None,
            suppressed: 0,
        }
    }

    /// Configured speed limit in km/h
    pub fn limit_kmh(&self) -> f32 {
        self.limit_kmh
    }

    /// Check one accepted speed sample
    ///
    /// Returns true when an alert should be sent now.
    pub fn check(&mut self, speed_kmh: f32, now_ms: u64) -> bool {
        if speed_kmh <= self.limit_kmh {
            return false;
        }
        match self.last_alert_ms {
            Some(last) if now_ms.saturating_sub(last) < self.window_ms => {
                self.suppressed = self.suppressed.saturating_add(1);
                false
            }
            _ => {
                self.last_alert_ms = Some(now_ms);
                true
            }
        }
    }

    /// Alerts swallowed by the debounce window since boot
    pub fn suppressed_count(&self) -> u32 {
        self.suppressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_under_limit_never_alerts() {
        let mut alarm = SpeedAlarm::new(100.0, 60_000);
        assert!(!alarm.check(99.9, 0));
        assert!(!alarm.check(100.0, 1000));
    }

    #[test]
    fn test_one_alert_per_window() {
        let mut alarm = SpeedAlarm::new(100.0, 60_000);

        assert!(alarm.check(120.0, 0));
        // Second excess sample inside the window: suppressed
        assert!(!alarm.check(130.0, 30_000));
        assert_eq!(alarm.suppressed_count(), 1);

        // Window elapsed: next excess sample alerts again
        assert!(alarm.check(115.0, 60_000));
    }

    #[test]
    fn test_window_measured_from_last_alert() {
        let mut alarm = SpeedAlarm::new(100.0, 60_000);
        assert!(alarm.check(120.0, 10_000));
        assert!(!alarm.check(120.0, 69_999));
        assert!(alarm.check(120.0, 70_000));
    }
}
