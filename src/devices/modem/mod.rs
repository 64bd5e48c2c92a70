//! GSM modem AT command channel
//!
//! Drives a line-oriented AT command/response protocol over the serial
//! link. Exactly one command is outstanding at any time, so every reply
//! is attributable to the most recent request without correlation ids.
//! All waits are deadline-bounded; a deadline expiring is the only
//! cancellation mechanism.
//!
//! ## Initialization sequence
//!
//! Liveness probe, echo off, inbound notification enable, SIM readiness
//! query, network registration poll, text mode, character set. Failure
//! at the readiness or registration step leaves the modem not-ready but
//! does not stop fix acquisition.

pub mod sms;

use crate::core::error::{ModemError, Result};
use crate::core::timing::Deadline;
use crate::platform::traits::{GpioInterface, TimerInterface, UartInterface};
use crate::{log_debug, log_info, log_warn};
use heapless::String;

/// Accumulated response capacity in bytes
pub const RESPONSE_CAPACITY: usize = 256;

/// Unsolicited line capacity in bytes
pub const LINE_CAPACITY: usize = 128;

/// Default deadline for simple commands
pub const DEFAULT_COMMAND_TIMEOUT_MS: u32 = 2000;

/// Deadline for the SIM readiness query
pub const SIM_QUERY_TIMEOUT_MS: u32 = 5000;

/// Bounded attempts for the network registration poll
pub const REGISTRATION_MAX_ATTEMPTS: u8 = 10;

/// Pause between registration poll attempts
const REGISTRATION_RETRY_DELAY_MS: u32 = 1000;

/// Reset line held asserted this long
pub const RESET_HOLD_MS: u32 = 100;

/// Settle time after releasing the reset line
pub const RESET_SETTLE_MS: u32 = 3000;

/// Receive poll granularity while waiting on a response
const POLL_INTERVAL_MS: u32 = 10;

/// Accumulated reply text
pub type ResponseText = String<RESPONSE_CAPACITY>;

/// Classified outcome of one command
#[derive(Debug, Clone, PartialEq)]
pub enum AtResponse {
    /// Reply contained the success token "OK"
    Ack(ResponseText),
    /// Reply contained the failure token "ERROR"
    Fail(ResponseText),
    /// Deadline elapsed without a recognized token
    Timeout,
}

impl AtResponse {
    /// True for a successful classification
    pub fn is_ack(&self) -> bool {
        matches!(self, AtResponse::Ack(_))
    }

    /// Accumulated reply text, if any arrived
    pub fn text(&self) -> Option<&str> {
        match self {
            AtResponse::Ack(t) | AtResponse::Fail(t) => Some(t.as_str()),
            AtResponse::Timeout => None,
        }
    }
}

/// Command channel state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    Idle,
    AwaitingResponse,
}

/// AT command channel over a UART
///
/// Generic over [`UartInterface`] so the whole engine runs against
/// `MockUart` on the host. Owns the serial port; the timer and the
/// reset pin are borrowed per call since the control loop owns them.
pub struct AtChannel<U: UartInterface> {
    uart: U,
    state: ChannelState,
    ready: bool,
    /// Accumulator for unsolicited lines read while idle
    pending: String<RESPONSE_CAPACITY>,
}

impl<U: UartInterface> AtChannel<U> {
    pub fn new(uart: U) -> Self {
        Self {
            uart,
            state: ChannelState::Idle,
            ready: false,
            pending: String::new(),
        }
    }

    /// True once the initialization sequence has completed
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Current channel state
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Access the underlying UART (test instrumentation, re-wiring)
    pub fn uart(&self) -> &U {
        &self.uart
    }

    /// Mutable access to the underlying UART
    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }

    /// Issue one command and classify the reply before the deadline
    ///
    /// Writes `command` terminated by a carriage return, then polls the
    /// receive path until the accumulated response contains "OK" or
    /// "ERROR", or `timeout_ms` elapses.
    ///
    /// # Errors
    ///
    /// `ModemError::ChannelBusy` if a previous command is still
    /// outstanding; platform errors from the UART pass through.
    pub fn execute<T: TimerInterface>(
        &mut self,
        timer: &mut T,
        command: &str,
        timeout_ms: u32,
    ) -> Result<AtResponse> {
        if self.state != ChannelState::Idle {
            return Err(ModemError::ChannelBusy.into());
        }
        // Bytes already waiting belong to unsolicited traffic, not to
        // the command we are about to send.
        self.drain_into_pending()?;

        log_debug!("modem <- {}", command);
        self.uart.write(command.as_bytes())?;
        self.uart.write(b"\r")?;
        self.uart.flush()?;

        self.state = ChannelState::AwaitingResponse;
        self.collect_response(timer, timeout_ms)
    }

    /// Poll until the accumulated reply classifies or the deadline expires
    ///
    /// Shared by `execute` and the SMS submission sequence. Always
    /// returns the channel to `Idle`.
    pub(crate) fn collect_response<T: TimerInterface>(
        &mut self,
        timer: &mut T,
        timeout_ms: u32,
    ) -> Result<AtResponse> {
        let deadline = Deadline::after_ms(timer, timeout_ms);
        let mut response: ResponseText = String::new();
        let mut chunk = [0u8; 32];

        let outcome = loop {
            while self.uart.available() {
                let n = self.uart.read(&mut chunk)?;
                if n == 0 {
                    break;
                }
                push_ascii(&mut response, &chunk[..n]);
            }

            if response.as_str().contains("OK") {
                break AtResponse::Ack(response);
            }
            if response.as_str().contains("ERROR") {
                break AtResponse::Fail(response);
            }
            if deadline.expired(timer) {
                break AtResponse::Timeout;
            }
            timer.delay_ms(POLL_INTERVAL_MS)?;
        };

        self.state = ChannelState::Idle;
        Ok(outcome)
    }

    /// Hard reset via the modem reset line
    ///
    /// Asserts the line low, holds briefly, releases, then waits the
    /// settle time. Used at startup and as recovery after repeated
    /// command failures. Clears channel state and any buffered input.
    pub fn hard_reset<T: TimerInterface, G: GpioInterface>(
        &mut self,
        timer: &mut T,
        reset_pin: &mut G,
    ) -> Result<()> {
        log_info!("modem hard reset");
        reset_pin.set_low()?;
        timer.delay_ms(RESET_HOLD_MS)?;
        reset_pin.set_high()?;
        timer.delay_ms(RESET_SETTLE_MS)?;

        self.state = ChannelState::Idle;
        self.ready = false;
        self.pending.clear();
        let mut sink = [0u8; 32];
        while self.uart.available() {
            if self.uart.read(&mut sink)? == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Run the ordered initialization sequence
    ///
    /// On success the channel is marked ready. A failed step aborts the
    /// sequence; the caller degrades to GPS-only operation and may retry
    /// after a hard reset.
    pub fn initialize<T: TimerInterface>(&mut self, timer: &mut T) -> Result<()> {
        self.ready = false;

        if !self.execute(timer, "AT", DEFAULT_COMMAND_TIMEOUT_MS)?.is_ack() {
            log_warn!("modem init: no response to liveness probe");
            return Err(ModemError::NoResponse.into());
        }
        if !self.execute(timer, "ATE0", DEFAULT_COMMAND_TIMEOUT_MS)?.is_ack() {
            return Err(ModemError::InitFailed.into());
        }
        if !self
            .execute(timer, "AT+CNMI=2,1", DEFAULT_COMMAND_TIMEOUT_MS)?
            .is_ack()
        {
            return Err(ModemError::InitFailed.into());
        }

        // SIM must report ready before anything network-facing
        let sim = self.execute(timer, "AT+CPIN?", SIM_QUERY_TIMEOUT_MS)?;
        let sim_ready = matches!(sim.text(), Some(text) if text.contains("READY"));
        if !sim_ready {
            log_warn!("modem init: SIM not ready");
            return Err(ModemError::InitFailed.into());
        }

        if !self.wait_for_registration(timer)? {
            log_warn!("modem init: network registration failed");
            return Err(ModemError::InitFailed.into());
        }

        if !self
            .execute(timer, "AT+CMGF=1", DEFAULT_COMMAND_TIMEOUT_MS)?
            .is_ack()
        {
            return Err(ModemError::InitFailed.into());
        }
        if !self
            .execute(timer, "AT+CSCS=\"GSM\"", DEFAULT_COMMAND_TIMEOUT_MS)?
            .is_ack()
        {
            return Err(ModemError::InitFailed.into());
        }

        self.ready = true;
        log_info!("modem ready");
        Ok(())
    }

    /// Poll AT+CREG? up to the attempt bound
    ///
    /// Registered home (1) and registered roaming (5) both count.
    fn wait_for_registration<T: TimerInterface>(&mut self, timer: &mut T) -> Result<bool> {
        for attempt in 1..=REGISTRATION_MAX_ATTEMPTS {
            let reply = self.execute(timer, "AT+CREG?", DEFAULT_COMMAND_TIMEOUT_MS)?;
            if let Some(text) = reply.text() {
                if registration_status_ok(text) {
                    log_debug!("registered on attempt {}", attempt);
                    return Ok(true);
                }
            }
            if attempt < REGISTRATION_MAX_ATTEMPTS {
                timer.delay_ms(REGISTRATION_RETRY_DELAY_MS)?;
            }
        }
        Ok(false)
    }

    /// Pull one complete unsolicited line, if available
    ///
    /// Drains the receive path into the pending accumulator and returns
    /// the first complete non-empty line, stripped of line terminators.
    /// Only meaningful while the channel is idle.
    pub fn poll_line(&mut self) -> Result<Option<String<LINE_CAPACITY>>> {
        self.drain_into_pending()?;

        loop {
            let newline = match self.pending.as_str().find('\n') {
                Some(pos) => pos,
                None => return Ok(None),
            };

            let mut line: String<LINE_CAPACITY> = String::new();
            for ch in self.pending.as_str()[..newline].chars() {
                if ch != '\r' && line.push(ch).is_err() {
                    break;
                }
            }

            // Drop the consumed prefix
            let mut rest: String<RESPONSE_CAPACITY> = String::new();
            let _ = rest.push_str(&self.pending.as_str()[newline + 1..]);
            self.pending = rest;

            if !line.is_empty() {
                return Ok(Some(line));
            }
        }
    }

    fn drain_into_pending(&mut self) -> Result<()> {
        let mut chunk = [0u8; 32];
        while self.uart.available() {
            let n = self.uart.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            push_ascii(&mut self.pending, &chunk[..n]);
        }
        Ok(())
    }
}

/// Append raw bytes as ASCII; non-ASCII bytes become '?', overflow is
/// silently truncated (a classifiable token will already be present).
fn push_ascii<const N: usize>(target: &mut String<N>, bytes: &[u8]) {
    for &b in bytes {
        let ch = if b.is_ascii() { b as char } else { '?' };
        if target.push(ch).is_err() {
            break;
        }
    }
}

/// True if a +CREG reply shows a registered status (1 home, 5 roaming)
fn registration_status_ok(text: &str) -> bool {
    // Reply shape: +CREG: <n>,<stat>
    match text.find("+CREG:") {
        Some(start) => {
            let after = &text[start..];
            match after.find(',') {
                Some(comma) => {
                    let stat = after[comma + 1..].trim_start();
                    stat.starts_with('1') || stat.starts_with('5')
                }
                None => false,
            }
        }
        None => false,
    }
}
