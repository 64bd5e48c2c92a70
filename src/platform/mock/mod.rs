//! Mock platform implementations for testing
//!
//! This module provides mock implementations of the platform traits that
//! can be used for unit and integration testing without hardware.
//!
//! # Feature Gate
//!
//! Available in two contexts:
//! - During test builds (`#[cfg(test)]`)
//! - When the `mock` feature is enabled
//!
//! # Example
//!
//! ```
//! use trail_beacon::platform::mock::MockUart;
//! use trail_beacon::platform::traits::UartInterface;
//!
//! let mut uart = MockUart::new(Default::default());
//! uart.write(b"AT\r").unwrap();
//! assert_eq!(uart.tx_data(), b"AT\r");
//! ```

#![cfg(any(test, feature = "mock"))]

mod gpio;
mod nvram;
mod timer;
mod uart;

pub use gpio::MockGpio;
pub use nvram::MockNvram;
pub use timer::MockTimer;
pub use uart::MockUart;
