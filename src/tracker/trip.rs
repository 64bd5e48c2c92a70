//! Trip distance accumulation
//!
//! Accumulates ground distance between consecutive accepted fixes using
//! the haversine formula. Jumps at or above the configured threshold are
//! discarded as outliers (multipath glitches teleport the solution) and
//! do not advance the odometer.

/// Mean Earth radius in meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Trip odometer
#[derive(Debug, Clone)]
pub struct TripMeter {
    total_m: f64,
    last_position: Option<(f64, f64)>,
    jump_threshold_m: f64,
}

impl TripMeter {
    /// Create a meter with the given outlier threshold in meters
    pub fn new(jump_threshold_m: f64) -> Self {
        Self {
            total_m: 0.0,
            last_position: None,
            jump_threshold_m,
        }
    }

    /// Advance with the next accepted position
    ///
    /// Returns the leg distance that was accumulated, zero for the first
    /// position and for discarded outlier jumps.
    pub fn advance(&mut self, latitude: f64, longitude: f64) -> f64 {
        let leg = match self.last_position {
            Some((last_lat, last_lon)) => haversine_m(last_lat, last_lon, latitude, longitude),
            None => 0.0,
        };
        self.last_position = Some((latitude, longitude));

        if leg >= self.jump_threshold_m {
            return 0.0;
        }
        self.total_m += leg;
        leg
    }

    /// Total accumulated distance in meters
    pub fn total_m(&self) -> f64 {
        self.total_m
    }

    /// Total accumulated distance in kilometers
    pub fn total_km(&self) -> f64 {
        self.total_m / 1000.0
    }
}

/// Great-circle distance between two coordinates in meters
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let rad = |deg: f64| deg * core::f64::consts::PI / 180.0;
    let phi1 = rad(lat1);
    let phi2 = rad(lat2);
    let d_phi = rad(lat2 - lat1);
    let d_lambda = rad(lon2 - lon1);

    let a = libm::sin(d_phi / 2.0) * libm::sin(d_phi / 2.0)
        + libm::cos(phi1) * libm::cos(phi2) * libm::sin(d_lambda / 2.0) * libm::sin(d_lambda / 2.0);
    let c = 2.0 * libm::atan2(libm::sqrt(a), libm::sqrt(1.0 - a));
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // One degree of latitude is roughly 111.2 km
        let d = haversine_m(48.0, 2.0, 49.0, 2.0);
        assert!((d - 111_200.0).abs() < 1000.0, "got {}", d);
    }

    #[test]
    fn test_first_position_accumulates_nothing() {
        let mut trip = TripMeter::new(1000.0);
        assert_eq!(trip.advance(48.0, 2.0), 0.0);
        assert_eq!(trip.total_m(), 0.0);
    }

    #[test]
    fn test_short_leg_accumulates() {
        let mut trip = TripMeter::new(1000.0);
        trip.advance(48.0, 2.0);
        // ~111 m north
        let leg = trip.advance(48.001, 2.0);
        assert!(leg > 100.0 && leg < 125.0, "got {}", leg);
        assert!(trip.total_m() > 100.0);
    }

    #[test]
    fn test_outlier_jump_discarded_but_position_updates() {
        let mut trip = TripMeter::new(1000.0);
        trip.advance(48.0, 2.0);
        // ~11 km teleport: discarded
        assert_eq!(trip.advance(48.1, 2.0), 0.0);
        assert_eq!(trip.total_m(), 0.0);

        // Next short leg measures from the new position
        let leg = trip.advance(48.101, 2.0);
        assert!(leg > 100.0 && leg < 125.0, "got {}", leg);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let mut strict = TripMeter::new(50.0);
        strict.advance(48.0, 2.0);
        // ~111 m leg exceeds a 50 m threshold
        assert_eq!(strict.advance(48.001, 2.0), 0.0);
        assert_eq!(strict.total_m(), 0.0);
    }
}
