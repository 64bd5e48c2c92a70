//! Mock UART implementation for testing

use crate::platform::{
    Result,
    traits::{UartConfig, UartInterface},
};
use core::cell::RefCell;
use std::collections::VecDeque;
use std::vec::Vec;

/// Mock UART implementation
///
/// Provides in-memory buffers for transmit and receive data, plus a
/// scripted-reply queue: each queued reply is moved into the receive
/// buffer when the next write completes, which lets tests script whole
/// AT command/response exchanges without hardware.
///
/// # Example
///
/// ```
/// use trail_beacon::platform::mock::MockUart;
/// use trail_beacon::platform::traits::UartInterface;
///
/// let mut uart = MockUart::new(Default::default());
///
/// // Script the modem's answer to the next command
/// uart.queue_reply(b"\r\nOK\r\n");
/// uart.write(b"AT\r").unwrap();
///
/// let mut buf = [0u8; 16];
/// let n = uart.read(&mut buf).unwrap();
/// assert_eq!(&buf[..n], b"\r\nOK\r\n");
/// ```
#[derive(Debug)]
pub struct MockUart {
    config: UartConfig,
    tx_buffer: RefCell<Vec<u8>>,
    rx_buffer: RefCell<Vec<u8>>,
    replies: RefCell<VecDeque<Vec<u8>>>,
}

impl MockUart {
    /// Create a new mock UART
    pub fn new(config: UartConfig) -> Self {
        Self {
            config,
            tx_buffer: RefCell::new(Vec::new()),
            rx_buffer: RefCell::new(Vec::new()),
            replies: RefCell::new(VecDeque::new()),
        }
    }

    /// Get transmitted data (for test verification)
    pub fn tx_data(&self) -> Vec<u8> {
        self.tx_buffer.borrow().clone()
    }

    /// Get transmitted data as a lossy string (for test verification)
    pub fn tx_text(&self) -> std::string::String {
        std::string::String::from_utf8_lossy(&self.tx_buffer.borrow()).into_owned()
    }

    /// Clear the transmit buffer
    pub fn clear_tx(&mut self) {
        self.tx_buffer.borrow_mut().clear();
    }

    /// Inject receive data immediately (for test setup)
    pub fn inject_rx(&mut self, data: &[u8]) {
        self.rx_buffer.borrow_mut().extend_from_slice(data);
    }

    /// Queue a reply delivered into the receive buffer on the next write
    ///
    /// Replies are consumed in FIFO order, one per write call that ends a
    /// command (any write). Multiple queued replies script multi-command
    /// sequences such as modem initialization.
    pub fn queue_reply(&mut self, data: &[u8]) {
        self.replies.borrow_mut().push_back(data.to_vec());
    }

    /// Number of scripted replies not yet delivered
    pub fn pending_replies(&self) -> usize {
        self.replies.borrow().len()
    }

    /// Get current baud rate
    pub fn baud_rate(&self) -> u32 {
        self.config.baud_rate
    }
}

impl UartInterface for MockUart {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.tx_buffer.borrow_mut().extend_from_slice(data);
        // A command terminator completes an exchange; release one
        // scripted reply if available.
        if data.ends_with(b"\r") || data == [0x1A] {
            if let Some(reply) = self.replies.borrow_mut().pop_front() {
                self.rx_buffer.borrow_mut().extend_from_slice(&reply);
            }
        }
        Ok(data.len())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut rx = self.rx_buffer.borrow_mut();
        let to_read = core::cmp::min(buffer.len(), rx.len());

        buffer[..to_read].copy_from_slice(&rx[..to_read]);
        rx.drain(..to_read);

        Ok(to_read)
    }

    fn set_baud_rate(&mut self, baud: u32) -> Result<()> {
        self.config.baud_rate = baud;
        Ok(())
    }

    fn available(&self) -> bool {
        !self.rx_buffer.borrow().is_empty()
    }

    fn flush(&mut self) -> Result<()> {
        // Nothing buffered on the transmit side to wait for
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_captures_tx() {
        let mut uart = MockUart::new(UartConfig::default());
        let written = uart.write(b"AT+CMGF=1\r").unwrap();
        assert_eq!(written, 10);
        assert_eq!(uart.tx_data(), b"AT+CMGF=1\r");
    }

    #[test]
    fn test_read_drains_injected_data() {
        let mut uart = MockUart::new(UartConfig::default());
        uart.inject_rx(b"+CMTI: \"SM\",3");

        let mut buffer = [0u8; 5];
        let read = uart.read(&mut buffer).unwrap();
        assert_eq!(read, 5);
        assert_eq!(&buffer, b"+CMTI");

        let mut rest = [0u8; 16];
        let read2 = uart.read(&mut rest).unwrap();
        assert_eq!(&rest[..read2], b": \"SM\",3");
    }

    #[test]
    fn test_available_tracks_rx_buffer() {
        let mut uart = MockUart::new(UartConfig::default());
        assert!(!uart.available());

        uart.inject_rx(b"X");
        assert!(uart.available());

        let mut buf = [0u8; 1];
        uart.read(&mut buf).unwrap();
        assert!(!uart.available());
    }

    #[test]
    fn test_scripted_reply_released_on_command_write() {
        let mut uart = MockUart::new(UartConfig::default());
        uart.queue_reply(b"OK\r\n");

        // No reply before any command is sent
        assert!(!uart.available());

        uart.write(b"ATE0\r").unwrap();
        assert!(uart.available());
        assert_eq!(uart.pending_replies(), 0);
    }

    #[test]
    fn test_scripted_replies_fifo_order() {
        let mut uart = MockUart::new(UartConfig::default());
        uart.queue_reply(b"first");
        uart.queue_reply(b"second");

        uart.write(b"AT\r").unwrap();
        let mut buf = [0u8; 8];
        let n = uart.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"first");

        uart.write(b"AT\r").unwrap();
        let n = uart.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"second");
    }

    #[test]
    fn test_set_baud_rate() {
        let mut uart = MockUart::new(UartConfig::default());
        assert_eq!(uart.baud_rate(), 115_200);

        uart.set_baud_rate(9600).unwrap();
        assert_eq!(uart.baud_rate(), 9600);
    }
}
