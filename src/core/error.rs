//! Tracker error taxonomy
//!
//! Recoverable errors (GPS, messaging) are logged and surfaced in status
//! reports without altering control flow. Modem initialization failure
//! degrades the device to GPS-only operation. A failed boot self-test is
//! the one fatal case.

use crate::platform::error::PlatformError;
use core::fmt;

/// Result type for tracker operations
pub type Result<T> = core::result::Result<T, TrackerError>;

/// GPS subsystem errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpsError {
    /// A raw sample failed the acceptance predicate
    InvalidSample,
    /// No accepted sample within the fix-lost window
    SignalLost,
    /// No fix ever acquired within the startup window
    AcquisitionTimeout,
}

/// Modem subsystem errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModemError {
    /// Liveness probe got no answer
    NoResponse,
    /// Initialization sequence aborted
    InitFailed,
    /// A command's deadline elapsed without a recognized reply
    CommandTimeout,
    /// A command was issued while another was outstanding
    ChannelBusy,
}

/// Messaging errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessagingError {
    /// Final send response did not arrive in time
    SendTimeout,
    /// Modem rejected the message
    SendRejected,
}

/// System-level errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemError {
    /// Boot-time I/O self-test failed; treated as fatal
    SelfTestFailed,
}

/// Top-level tracker error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrackerError {
    Gps(GpsError),
    Modem(ModemError),
    Messaging(MessagingError),
    System(SystemError),
    Platform(PlatformError),
}

impl TrackerError {
    /// Short category label used in status reports and log lines
    pub fn category(&self) -> &'static str {
        match self {
            TrackerError::Gps(_) => "GPS",
            TrackerError::Modem(_) => "MODEM",
            TrackerError::Messaging(_) => "SMS",
            TrackerError::System(_) => "SYSTEM",
            TrackerError::Platform(_) => "PLATFORM",
        }
    }
}

impl From<GpsError> for TrackerError {
    fn from(e: GpsError) -> Self {
        TrackerError::Gps(e)
    }
}

impl From<ModemError> for TrackerError {
    fn from(e: ModemError) -> Self {
        TrackerError::Modem(e)
    }
}

impl From<MessagingError> for TrackerError {
    fn from(e: MessagingError) -> Self {
        TrackerError::Messaging(e)
    }
}

impl From<SystemError> for TrackerError {
    fn from(e: SystemError) -> Self {
        TrackerError::System(e)
    }
}

impl From<PlatformError> for TrackerError {
    fn from(e: PlatformError) -> Self {
        TrackerError::Platform(e)
    }
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::Gps(e) => write!(f, "GPS: {:?}", e),
            TrackerError::Modem(e) => write!(f, "MODEM: {:?}", e),
            TrackerError::Messaging(e) => write!(f, "SMS: {:?}", e),
            TrackerError::System(e) => write!(f, "SYSTEM: {:?}", e),
            TrackerError::Platform(e) => write!(f, "PLATFORM: {}", e),
        }
    }
}
