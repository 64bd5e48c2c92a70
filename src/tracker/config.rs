//! Tracker configuration

/// Static device configuration
///
/// Owned by the tracker context; all tunables live here rather than in
/// scattered constants so a deployment can adjust them in one place.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Device identifier included in every report
    pub device_id: &'static str,
    /// Route or vehicle name included in every report
    pub route_name: &'static str,
    /// Recipient of reports and alert messages
    pub primary_contact: &'static str,
    /// Speed alert threshold in km/h
    pub speed_limit_kmh: f32,
    /// Minimum spacing between two speed alerts
    pub speed_alert_window_ms: u64,
    /// Health evaluation period
    pub health_period_ms: u64,
    /// Distance jumps at or above this are discarded as outliers
    pub trip_jump_threshold_m: f64,
    /// Consecutive command failures before a modem hard reset
    pub modem_failure_reset_threshold: u8,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            device_id: "TRAIL-BEACON-01",
            route_name: "ROUTE-A",
            primary_contact: "+15550100",
            speed_limit_kmh: 100.0,
            speed_alert_window_ms: 60_000,
            health_period_ms: 60_000,
            trip_jump_threshold_m: 1000.0,
            modem_failure_reset_threshold: 3,
        }
    }
}
