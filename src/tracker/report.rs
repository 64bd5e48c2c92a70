//! Outbound report composition
//!
//! Fixed templates for the texts the device sends: position reports,
//! status summaries, alerts, and help. Everything is composed into
//! heapless strings; capacity overflow truncates, which for SMS bodies
//! is the correct failure mode.

use crate::core::error::TrackerError;
use crate::core::error_log::ErrorRecord;
use crate::core::stats::Statistics;
use crate::devices::gps::Fix;
use crate::tracker::health::HealthStatus;
use crate::tracker::mode::Mode;
use crate::tracker::config::TrackerConfig;
use core::fmt::Write as _;
use heapless::String;

/// Composed message capacity; fits a short concatenated SMS
pub const REPORT_CAPACITY: usize = 320;

/// Composed report text
pub type ReportText = String<REPORT_CAPACITY>;

/// Position report for the primary contact
///
/// Template: identifier and route; location as signed decimal degrees to
/// 6 places; speed to 1 decimal; altitude integer meters; satellite
/// count; timestamp `DD/MM/YYYY HH:MM:SS`; a map link built from the
/// same coordinates; mode annotation for Tracking and Emergency.
pub fn position_report(config: &TrackerConfig, fix: &Fix, mode: Mode) -> ReportText {
    let mut text = ReportText::new();
    let s = &fix.sample;

    match mode {
        Mode::Emergency => {
            let _ = text.push_str("[EMERGENCY] ");
        }
        Mode::Tracking => {
            let _ = text.push_str("[TRACKING] ");
        }
        Mode::Normal => {}
    }

    let _ = writeln!(text, "{} {}", config.device_id, config.route_name);
    let _ = writeln!(text, "Lat: {:.6}", s.latitude);
    let _ = writeln!(text, "Lon: {:.6}", s.longitude);
    let _ = writeln!(text, "Speed: {:.1} km/h", s.speed_kmh);
    let _ = writeln!(text, "Alt: {} m", s.altitude_m as i32);
    let _ = writeln!(text, "Sats: {}", s.satellites);
    let _ = writeln!(
        text,
        "Time: {:02}/{:02}/{:04} {:02}:{:02}:{:02}",
        s.time.day, s.time.month, s.time.year, s.time.hour, s.time.minute, s.time.second
    );
    let _ = write!(
        text,
        "https://maps.google.com/?q={:.6},{:.6}",
        s.latitude, s.longitude
    );
    text
}

/// Startup announcement, sent once when the modem becomes ready
pub fn startup_report(config: &TrackerConfig) -> ReportText {
    let mut text = ReportText::new();
    let _ = write!(
        text,
        "{} {} online. Send HELP for commands.",
        config.device_id, config.route_name
    );
    text
}

/// Status summary for the STATUS verb
pub fn status_report(
    config: &TrackerConfig,
    mode: Mode,
    fix: Option<&Fix>,
    stats: &Statistics,
    trip_km: f64,
    last_error: Option<&ErrorRecord>,
) -> ReportText {
    let mut text = ReportText::new();
    let _ = writeln!(text, "{} status", config.device_id);
    let _ = writeln!(text, "Mode: {}", mode.as_str());
    match fix {
        Some(f) if f.valid => {
            let _ = writeln!(text, "Fix: OK ({} sats)", f.sample.satellites);
        }
        _ => {
            let _ = text.push_str("Fix: NONE\n");
        }
    }
    let _ = writeln!(text, "Trip: {:.1} km", trip_km);
    let _ = writeln!(text, "Max speed: {:.1} km/h", stats.max_speed_kmh);
    let _ = writeln!(text, "Sent: {}", stats.messages_sent);
    let _ = write!(text, "Errors: {}", stats.error_count);
    if let Some(record) = last_error {
        let _ = write!(text, " (last: {})", record.message.as_str());
    }
    text
}

/// Speed alert body
pub fn speed_alert(config: &TrackerConfig, speed_kmh: f32, limit_kmh: f32) -> ReportText {
    let mut text = ReportText::new();
    let _ = write!(
        text,
        "{} SPEED ALERT: {:.1} km/h (limit {:.1})",
        config.device_id, speed_kmh, limit_kmh
    );
    text
}

/// Health alert body, naming the failed subsystem and last logged error
pub fn health_alert(
    config: &TrackerConfig,
    status: &HealthStatus,
    last_error: Option<&ErrorRecord>,
) -> ReportText {
    let mut text = ReportText::new();
    let _ = write!(
        text,
        "{} HEALTH ALERT: {} failure",
        config.device_id,
        status.failed_subsystem().unwrap_or("UNKNOWN")
    );
    if let Some(record) = last_error {
        let _ = write!(text, ". Last error: {}", record.message.as_str());
    }
    text
}

/// Diagnostic reply for the TEST verb
pub fn test_report(config: &TrackerConfig, modem_alive: bool, fixed: bool) -> ReportText {
    let mut text = ReportText::new();
    let _ = write!(
        text,
        "{} self test: modem {}, gps {}",
        config.device_id,
        if modem_alive { "OK" } else { "FAIL" },
        if fixed { "OK" } else { "NO FIX" }
    );
    text
}

/// Best-effort alert for a failed boot self-test
pub fn self_test_alert(config: &TrackerConfig, error: &TrackerError) -> ReportText {
    let mut text = ReportText::new();
    let _ = write!(
        text,
        "{} FATAL: self test failed ({}). Halting.",
        config.device_id, error
    );
    text
}

/// Reply for the HELP verb
pub fn help_text() -> ReportText {
    let mut text = ReportText::new();
    let _ = text.push_str(
        "Commands: TRACK ON, TRACK OFF, EMERGENCY OFF, STATUS, LOCATION, TEST, HELP, REBOOT",
    );
    text
}
