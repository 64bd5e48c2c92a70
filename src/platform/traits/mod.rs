//! Platform abstraction traits
//!
//! This module defines the traits that platform implementations must provide.

pub mod gpio;
pub mod nvram;
pub mod timer;
pub mod uart;

// Re-export trait interfaces
pub use gpio::{GpioInterface, GpioMode};
pub use nvram::NvramInterface;
pub use timer::TimerInterface;
pub use uart::{UartConfig, UartInterface, UartParity, UartStopBits};
