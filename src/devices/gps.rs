//! Fix validation and fix state tracking
//!
//! Raw fix samples arrive already decoded from the receiver. This module
//! filters them through the acceptance predicate and tracks the
//! NoFix/Fixed state machine, including the fix-lost window and the
//! one-shot acquisition timeout after startup.

/// Minimum satellites for an acceptable sample
pub const MIN_SATELLITES: u8 = 4;

/// Maximum horizontal dilution of precision
pub const MAX_HDOP: f32 = 2.0;

/// Maximum plausible road speed in km/h
pub const MAX_SPEED_KMH: f32 = 200.0;

/// Fix considered lost after this long without an accepted sample
pub const FIX_LOST_TIMEOUT_MS: u64 = 30_000;

/// One-shot startup window for the first fix
pub const ACQUISITION_TIMEOUT_MS: u64 = 180_000;

/// UTC wall-clock time as reported by the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UtcTime {
    pub year: u16,
    /// 1-12
    pub month: u8,
    /// 1-31
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// One raw decoded sample from the receiver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixSample {
    /// Latitude in signed decimal degrees
    pub latitude: f64,
    /// Longitude in signed decimal degrees
    pub longitude: f64,
    /// Altitude in meters above sea level
    pub altitude_m: f32,
    /// Ground speed in km/h
    pub speed_kmh: f32,
    /// Satellites used in the solution
    pub satellites: u8,
    /// Horizontal dilution of precision
    pub hdop: f32,
    /// UTC timestamp of the sample
    pub time: UtcTime,
}

/// The current validated fix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    /// The accepted sample
    pub sample: FixSample,
    /// False once the fix-lost window elapses without a fresh sample
    pub valid: bool,
}

/// Why a sample was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RejectReason {
    LatitudeOutOfRange,
    LongitudeOutOfRange,
    /// Both coordinates exactly zero
    NullIsland,
    SpeedOutOfRange,
    TooFewSatellites,
    PoorAccuracy,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::LatitudeOutOfRange => "latitude out of range",
            RejectReason::LongitudeOutOfRange => "longitude out of range",
            RejectReason::NullIsland => "zero coordinates",
            RejectReason::SpeedOutOfRange => "speed out of range",
            RejectReason::TooFewSatellites => "too few satellites",
            RejectReason::PoorAccuracy => "hdop too high",
        }
    }
}

/// Acceptance predicate; all conditions must hold
pub fn validate(sample: &FixSample) -> Result<(), RejectReason> {
    if sample.latitude.abs() > 90.0 {
        return Err(RejectReason::LatitudeOutOfRange);
    }
    if sample.longitude.abs() > 180.0 {
        return Err(RejectReason::LongitudeOutOfRange);
    }
    if sample.latitude == 0.0 && sample.longitude == 0.0 {
        return Err(RejectReason::NullIsland);
    }
    if !(0.0..=MAX_SPEED_KMH).contains(&sample.speed_kmh) {
        return Err(RejectReason::SpeedOutOfRange);
    }
    if sample.satellites < MIN_SATELLITES {
        return Err(RejectReason::TooFewSatellites);
    }
    if sample.hdop > MAX_HDOP {
        return Err(RejectReason::PoorAccuracy);
    }
    Ok(())
}

/// Fix state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FixState {
    NoFix,
    Fixed,
}

/// State transition events the tracker loop reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FixEvent {
    /// NoFix -> Fixed; triggers an immediate report
    Acquired,
    /// Fixed -> NoFix after the fix-lost window
    Lost,
    /// No fix acquired within the startup window (one-shot, non-fatal)
    AcquisitionTimeout,
}

/// NoFix/Fixed state machine over validated samples
///
/// `offer` feeds one raw sample; `tick` drives the time-based
/// transitions. Rejected samples never touch the current fix.
pub struct FixMonitor {
    state: FixState,
    current: Option<Fix>,
    last_accept_ms: u64,
    start_ms: u64,
    acquisition_timeout_fired: bool,
    ever_fixed: bool,
}

impl FixMonitor {
    /// Create a monitor; `now_ms` starts the acquisition window
    pub fn new(now_ms: u64) -> Self {
        Self {
            state: FixState::NoFix,
            current: None,
            last_accept_ms: 0,
            start_ms: now_ms,
            acquisition_timeout_fired: false,
            ever_fixed: false,
        }
    }

    /// Current state
    pub fn state(&self) -> FixState {
        self.state
    }

    /// The current fix; `valid` is false after fix loss
    pub fn current(&self) -> Option<&Fix> {
        self.current.as_ref()
    }

    /// True while a fresh accepted fix is held
    pub fn is_fixed(&self) -> bool {
        self.state == FixState::Fixed
    }

    /// True if a fix has ever been acquired since startup
    pub fn ever_fixed(&self) -> bool {
        self.ever_fixed
    }

    /// Offer one raw sample
    ///
    /// On acceptance the current fix is replaced and `Ok(Some(Acquired))`
    /// is returned for a NoFix -> Fixed transition. On rejection the
    /// reason is returned and the current fix is untouched.
    pub fn offer(&mut self, sample: FixSample, now_ms: u64) -> Result<Option<FixEvent>, RejectReason> {
        validate(&sample)?;

        self.current = Some(Fix {
            sample,
            valid: true,
        });
        self.last_accept_ms = now_ms;

        let event = if self.state == FixState::NoFix {
            self.state = FixState::Fixed;
            self.ever_fixed = true;
            Some(FixEvent::Acquired)
        } else {
            None
        };
        Ok(event)
    }

    /// Drive time-based transitions; call once per loop iteration
    pub fn tick(&mut self, now_ms: u64) -> Option<FixEvent> {
        match self.state {
            FixState::Fixed => {
                if now_ms.saturating_sub(self.last_accept_ms) >= FIX_LOST_TIMEOUT_MS {
                    self.state = FixState::NoFix;
                    if let Some(fix) = self.current.as_mut() {
                        fix.valid = false;
                    }
                    return Some(FixEvent::Lost);
                }
            }
            FixState::NoFix => {
                if !self.ever_fixed
                    && !self.acquisition_timeout_fired
                    && now_ms.saturating_sub(self.start_ms) >= ACQUISITION_TIMEOUT_MS
                {
                    self.acquisition_timeout_fired = true;
                    return Some(FixEvent::AcquisitionTimeout);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_sample() -> FixSample {
        FixSample {
            latitude: 48.8584,
            longitude: 2.2945,
            altitude_m: 35.0,
            speed_kmh: 50.0,
            satellites: 7,
            hdop: 0.9,
            time: UtcTime {
                year: 2026,
                month: 8,
                day: 7,
                hour: 12,
                minute: 30,
                second: 0,
            },
        }
    }

    #[test]
    fn test_validate_accepts_good_sample() {
        assert_eq!(validate(&good_sample()), Ok(()));
    }

    #[test]
    fn test_validate_rejects_few_satellites() {
        let mut s = good_sample();
        s.satellites = 3;
        assert_eq!(validate(&s), Err(RejectReason::TooFewSatellites));
    }

    #[test]
    fn test_validate_rejects_high_hdop() {
        let mut s = good_sample();
        s.hdop = 2.1;
        assert_eq!(validate(&s), Err(RejectReason::PoorAccuracy));
    }

    #[test]
    fn test_validate_rejects_out_of_range_coordinates() {
        let mut s = good_sample();
        s.latitude = 90.5;
        assert_eq!(validate(&s), Err(RejectReason::LatitudeOutOfRange));

        let mut s = good_sample();
        s.longitude = -180.5;
        assert_eq!(validate(&s), Err(RejectReason::LongitudeOutOfRange));
    }

    #[test]
    fn test_validate_rejects_null_island() {
        let mut s = good_sample();
        s.latitude = 0.0;
        s.longitude = 0.0;
        assert_eq!(validate(&s), Err(RejectReason::NullIsland));
    }

    #[test]
    fn test_validate_rejects_speed_out_of_range() {
        let mut s = good_sample();
        s.speed_kmh = 200.1;
        assert_eq!(validate(&s), Err(RejectReason::SpeedOutOfRange));

        s.speed_kmh = -0.1;
        assert_eq!(validate(&s), Err(RejectReason::SpeedOutOfRange));
    }

    #[test]
    fn test_rejected_sample_leaves_fix_unchanged() {
        let mut monitor = FixMonitor::new(0);
        monitor.offer(good_sample(), 1000).unwrap();
        let before = *monitor.current().unwrap();

        let mut bad = good_sample();
        bad.satellites = 2;
        bad.latitude = 10.0;
        assert!(monitor.offer(bad, 2000).is_err());

        assert_eq!(*monitor.current().unwrap(), before);
        assert!(monitor.is_fixed());
    }

    #[test]
    fn test_first_accept_emits_acquired() {
        let mut monitor = FixMonitor::new(0);
        assert_eq!(monitor.state(), FixState::NoFix);

        let event = monitor.offer(good_sample(), 500).unwrap();
        assert_eq!(event, Some(FixEvent::Acquired));
        assert_eq!(monitor.state(), FixState::Fixed);

        // Further accepted samples supersede the fix without an event
        let event = monitor.offer(good_sample(), 1000).unwrap();
        assert_eq!(event, None);
    }

    #[test]
    fn test_fix_lost_after_window() {
        let mut monitor = FixMonitor::new(0);
        monitor.offer(good_sample(), 1000).unwrap();

        assert_eq!(monitor.tick(1000 + FIX_LOST_TIMEOUT_MS - 1), None);
        assert_eq!(
            monitor.tick(1000 + FIX_LOST_TIMEOUT_MS),
            Some(FixEvent::Lost)
        );
        assert_eq!(monitor.state(), FixState::NoFix);
        assert!(!monitor.current().unwrap().valid);
    }

    #[test]
    fn test_reacquisition_emits_acquired_again() {
        let mut monitor = FixMonitor::new(0);
        monitor.offer(good_sample(), 1000).unwrap();
        monitor.tick(1000 + FIX_LOST_TIMEOUT_MS);

        let event = monitor.offer(good_sample(), 40_000).unwrap();
        assert_eq!(event, Some(FixEvent::Acquired));
        assert!(monitor.current().unwrap().valid);
    }

    #[test]
    fn test_acquisition_timeout_fires_once() {
        let mut monitor = FixMonitor::new(0);

        assert_eq!(monitor.tick(ACQUISITION_TIMEOUT_MS - 1), None);
        assert_eq!(
            monitor.tick(ACQUISITION_TIMEOUT_MS),
            Some(FixEvent::AcquisitionTimeout)
        );
        // One-shot: never repeats
        assert_eq!(monitor.tick(ACQUISITION_TIMEOUT_MS * 2), None);
        assert_eq!(monitor.state(), FixState::NoFix);
    }

    #[test]
    fn test_no_acquisition_timeout_after_fix() {
        let mut monitor = FixMonitor::new(0);
        monitor.offer(good_sample(), 1000).unwrap();
        // Lose the fix, then pass the startup window with no fix
        monitor.tick(1000 + FIX_LOST_TIMEOUT_MS);
        assert_eq!(monitor.tick(ACQUISITION_TIMEOUT_MS + 1000), None);
    }
}
