//! Non-volatile storage interface trait
//!
//! A small byte-addressed key-value region used to persist counters
//! across power cycles. Platform implementations back this with EEPROM,
//! flash emulation, or a battery-backed RAM section.

use crate::platform::Result;

/// Non-volatile storage region interface
pub trait NvramInterface {
    /// Read `buffer.len()` bytes starting at `offset`
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Nvram(NvramError::OutOfBounds)` if the
    /// range does not fit inside the region.
    fn read(&mut self, offset: u32, buffer: &mut [u8]) -> Result<()>;

    /// Write `data` starting at `offset`
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<()>;

    /// Total region size in bytes
    fn capacity(&self) -> u32;
}
