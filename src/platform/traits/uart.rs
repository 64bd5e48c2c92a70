//! UART interface trait
//!
//! Defines the serial port abstraction used by device drivers. The modem
//! channel is generic over this trait, which is what makes the whole
//! command engine testable against `MockUart`.

use crate::platform::Result;

/// UART parity setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartParity {
    None,
    Even,
    Odd,
}

/// UART stop bits setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartStopBits {
    One,
    Two,
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baud_rate: u32,
    /// Data bits per frame (usually 8)
    pub data_bits: u8,
    /// Parity setting
    pub parity: UartParity,
    /// Stop bits setting
    pub stop_bits: UartStopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: 8,
            parity: UartParity::None,
            stop_bits: UartStopBits::One,
        }
    }
}

/// UART peripheral interface
///
/// Platform implementations provide blocking, non-buffering semantics:
/// `read` returns whatever is currently available without waiting, and
/// `write` pushes the full slice into the transmit path.
pub trait UartInterface {
    /// Write bytes to the UART
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Uart(UartError::WriteFailed)` if the
    /// transmit path rejects the data.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read available bytes into `buffer` without blocking
    ///
    /// Returns the number of bytes read, which may be zero.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Change the baud rate
    fn set_baud_rate(&mut self, baud: u32) -> Result<()>;

    /// Return true if received data is waiting to be read
    fn available(&self) -> bool;

    /// Block until all queued transmit data has been sent
    fn flush(&mut self) -> Result<()>;
}
