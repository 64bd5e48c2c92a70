//! SMS send/receive primitives
//!
//! Built on the AT channel. Sending follows the multi-step CMGS prompt
//! sequence: begin-command with quoted recipient, paced delay, raw body
//! bytes, paced delay, a single 0x1A terminator, then classification of
//! the final response within a long deadline. Receiving reacts to
//! unsolicited +CMTI notifications: read the indicated slot, hand the
//! text to the caller, and always delete the slot so the store never
//! fills.

use super::{AtChannel, AtResponse, ChannelState, DEFAULT_COMMAND_TIMEOUT_MS};
use crate::core::error::{ModemError, Result};
use crate::log_debug;
use crate::platform::traits::{TimerInterface, UartInterface};
use core::fmt::Write as _;
use heapless::String;

/// Deadline for the final send response
pub const SEND_TIMEOUT_MS: u32 = 15_000;

/// Pacing delay between the steps of the submission sequence
pub const SEND_SETTLE_MS: u32 = 500;

/// Message body terminator (Ctrl-Z)
const BODY_TERMINATOR: u8 = 0x1A;

/// Retrieved message capacity
pub const MESSAGE_CAPACITY: usize = 256;

impl<U: UartInterface> AtChannel<U> {
    /// Submit one text message
    ///
    /// Runs the full CMGS sequence and classifies the final response.
    /// The caller maps `Fail`/`Timeout` to a messaging error and decides
    /// whether to resend at the next scheduled opportunity; there is no
    /// device-level retry.
    pub fn send_sms<T: TimerInterface>(
        &mut self,
        timer: &mut T,
        recipient: &str,
        body: &str,
    ) -> Result<AtResponse> {
        if self.state() != ChannelState::Idle {
            return Err(ModemError::ChannelBusy.into());
        }

        let mut begin: String<40> = String::new();
        let _ = write!(begin, "AT+CMGS=\"{}\"", recipient);
        log_debug!("sms -> {}", recipient);

        self.uart_mut().write(begin.as_bytes())?;
        self.uart_mut().write(b"\r")?;
        timer.delay_ms(SEND_SETTLE_MS)?;

        self.uart_mut().write(body.as_bytes())?;
        timer.delay_ms(SEND_SETTLE_MS)?;

        self.uart_mut().write(&[BODY_TERMINATOR])?;
        self.state = ChannelState::AwaitingResponse;
        self.collect_response(timer, SEND_TIMEOUT_MS)
    }

    /// Parse a waiting +CMTI notification into a message index
    ///
    /// Drains unsolicited lines; lines that are not +CMTI notifications
    /// are discarded. Returns the first index found, if any.
    pub fn poll_notification(&mut self) -> Result<Option<u8>> {
        while let Some(line) = self.poll_line()? {
            if let Some(index) = parse_cmti_index(line.as_str()) {
                return Ok(Some(index));
            }
            log_debug!("ignoring unsolicited line: {}", line.as_str());
        }
        Ok(None)
    }

    /// Read the stored message at `index`
    ///
    /// Returns the raw retrieval response text (header line plus body);
    /// the command interpreter works on the whole text.
    pub fn read_message<T: TimerInterface>(
        &mut self,
        timer: &mut T,
        index: u8,
    ) -> Result<Option<String<MESSAGE_CAPACITY>>> {
        let mut command: String<16> = String::new();
        let _ = write!(command, "AT+CMGR={}", index);

        match self.execute(timer, command.as_str(), DEFAULT_COMMAND_TIMEOUT_MS)? {
            AtResponse::Ack(text) => {
                let mut body: String<MESSAGE_CAPACITY> = String::new();
                let _ = body.push_str(text.as_str());
                Ok(Some(body))
            }
            _ => Ok(None),
        }
    }

    /// Delete the stored message at `index`
    ///
    /// Called after every retrieval, recognized command or not, so the
    /// message store cannot fill up.
    pub fn delete_message<T: TimerInterface>(
        &mut self,
        timer: &mut T,
        index: u8,
    ) -> Result<AtResponse> {
        let mut command: String<16> = String::new();
        let _ = write!(command, "AT+CMGD={}", index);
        self.execute(timer, command.as_str(), DEFAULT_COMMAND_TIMEOUT_MS)
    }
}

/// Extract the message index from a +CMTI line
///
/// Shape: `+CMTI: "SM",<index>`
fn parse_cmti_index(line: &str) -> Option<u8> {
    if !line.contains("+CMTI") {
        return None;
    }
    let comma = line.rfind(',')?;
    line[comma + 1..].trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{MockTimer, MockUart};

    fn channel() -> AtChannel<MockUart> {
        AtChannel::new(MockUart::new(Default::default()))
    }

    #[test]
    fn test_send_sms_wire_sequence() {
        let mut ch = channel();
        let mut timer = MockTimer::new();
        ch.uart_mut().queue_reply(b"\r\n> "); // prompt after begin-command
        ch.uart_mut().queue_reply(b"\r\n+CMGS: 12\r\n\r\nOK\r\n");

        let reply = ch
            .send_sms(&mut timer, "+15550100", "position report")
            .unwrap();

        assert!(reply.is_ack());
        let tx = ch.uart().tx_data();
        let expected_prefix = b"AT+CMGS=\"+15550100\"\rposition report\x1a";
        assert_eq!(&tx[..expected_prefix.len()], expected_prefix);
        // Both pacing delays elapsed
        assert!(timer.now_ms() >= 2 * SEND_SETTLE_MS as u64);
    }

    #[test]
    fn test_send_sms_without_final_token_times_out() {
        let mut ch = channel();
        let mut timer = MockTimer::new();
        // Prompt arrives but the final response never does
        ch.uart_mut().queue_reply(b"\r\n> ");

        let reply = ch.send_sms(&mut timer, "+15550100", "body").unwrap();

        assert_eq!(reply, AtResponse::Timeout);
        assert!(timer.now_ms() >= SEND_TIMEOUT_MS as u64);
        assert_eq!(ch.state(), ChannelState::Idle);
    }

    #[test]
    fn test_send_sms_rejected_classifies_fail() {
        let mut ch = channel();
        let mut timer = MockTimer::new();
        ch.uart_mut().queue_reply(b"\r\n> ");
        ch.uart_mut().queue_reply(b"\r\n+CMS ERROR: 302\r\n");

        let reply = ch.send_sms(&mut timer, "+15550100", "body").unwrap();
        assert!(matches!(reply, AtResponse::Fail(_)));
    }

    #[test]
    fn test_poll_notification_parses_index() {
        let mut ch = channel();
        ch.uart_mut().inject_rx(b"\r\n+CMTI: \"SM\",7\r\n");

        assert_eq!(ch.poll_notification().unwrap(), Some(7));
        assert_eq!(ch.poll_notification().unwrap(), None);
    }

    #[test]
    fn test_poll_notification_skips_other_urc_lines() {
        let mut ch = channel();
        ch.uart_mut()
            .inject_rx(b"\r\nRING\r\n\r\n+CMTI: \"SM\",2\r\n");

        assert_eq!(ch.poll_notification().unwrap(), Some(2));
    }

    #[test]
    fn test_read_and_delete_message() {
        let mut ch = channel();
        let mut timer = MockTimer::new();
        ch.uart_mut().queue_reply(
            b"\r\n+CMGR: \"REC UNREAD\",\"+15550100\"\r\ntrack on\r\n\r\nOK\r\n",
        );
        ch.uart_mut().queue_reply(b"\r\nOK\r\n");

        let text = ch.read_message(&mut timer, 3).unwrap().unwrap();
        assert!(text.as_str().contains("track on"));

        let reply = ch.delete_message(&mut timer, 3).unwrap();
        assert!(reply.is_ack());

        let tx = ch.uart().tx_text();
        assert!(tx.contains("AT+CMGR=3\r"));
        assert!(tx.contains("AT+CMGD=3\r"));
    }

    #[test]
    fn test_cmti_index_parsing() {
        assert_eq!(parse_cmti_index("+CMTI: \"SM\",15"), Some(15));
        assert_eq!(parse_cmti_index("+CMTI: \"ME\", 3"), Some(3));
        assert_eq!(parse_cmti_index("RING"), None);
        assert_eq!(parse_cmti_index("+CMTI: malformed"), None);
    }
}
