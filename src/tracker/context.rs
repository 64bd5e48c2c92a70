//! Device context and control loop
//!
//! One `Tracker` instance owns all mutable device state and is driven by
//! a single-threaded cooperative loop: feed raw fix samples through
//! [`Tracker::on_fix_sample`] and call [`Tracker::step`] once per
//! iteration. The only blocking operations are modem exchanges, each
//! bounded by an explicit deadline.

use crate::core::error::{GpsError, MessagingError, ModemError, SystemError, TrackerError};
use crate::core::error_log::ErrorLog;
use crate::core::stats::Statistics;
use crate::devices::gps::{FixEvent, FixMonitor, FixSample, MIN_SATELLITES};
use crate::devices::modem::{AtChannel, AtResponse};
use crate::platform::traits::{GpioInterface, NvramInterface, TimerInterface, UartInterface};
use crate::tracker::alerts::SpeedAlarm;
use crate::tracker::command::{self, Verb};
use crate::tracker::config::TrackerConfig;
use crate::tracker::health::{HealthMonitor, HealthStatus, PROBE_TIMEOUT_MS};
use crate::tracker::mode::Mode;
use crate::tracker::report::{self, ReportText};
use crate::tracker::trip::TripMeter;
use crate::{log_info, log_warn};

/// Symbolic status for the external indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusCode {
    WaitingForFix,
    FixedOk,
    Error,
    Emergency,
}

/// What the embedding runtime should do after a loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopAction {
    /// Keep looping
    Continue,
    /// Restart the device (REBOOT command)
    Reboot,
    /// Terminal halt; requires external intervention
    Halt,
}

/// Device context: all mutable state, owned by the control loop
pub struct Tracker<U: UartInterface> {
    config: TrackerConfig,
    modem: AtChannel<U>,
    fix: FixMonitor,
    mode: Mode,
    stats: Statistics,
    error_log: ErrorLog,
    health: HealthMonitor,
    speed_alarm: SpeedAlarm,
    trip: TripMeter,
    last_report_ms: u64,
    startup_report_sent: bool,
    command_failures: u8,
    pending_action: Option<LoopAction>,
    halted: bool,
}

impl<U: UartInterface> Tracker<U> {
    pub fn new(config: TrackerConfig, uart: U, now_ms: u64) -> Self {
        let speed_alarm = SpeedAlarm::new(config.speed_limit_kmh, config.speed_alert_window_ms);
        let trip = TripMeter::new(config.trip_jump_threshold_m);
        let health = HealthMonitor::new(config.health_period_ms, now_ms);
        Self {
            config,
            modem: AtChannel::new(uart),
            fix: FixMonitor::new(now_ms),
            mode: Mode::Normal,
            stats: Statistics::default(),
            error_log: ErrorLog::new(),
            health,
            speed_alarm,
            trip,
            last_report_ms: 0,
            startup_report_sent: false,
            command_failures: 0,
            pending_action: None,
            halted: false,
        }
    }

    /// Current operational mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current statistics
    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// Diagnostic error log
    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    /// Fix state machine
    pub fn fix_monitor(&self) -> &FixMonitor {
        &self.fix
    }

    /// Modem channel (test instrumentation)
    pub fn modem(&self) -> &AtChannel<U> {
        &self.modem
    }

    /// Mutable modem channel (test instrumentation)
    pub fn modem_mut(&mut self) -> &mut AtChannel<U> {
        &mut self.modem
    }

    /// Symbolic status for the external indicator
    pub fn status_code(&self) -> StatusCode {
        if self.halted {
            return StatusCode::Error;
        }
        if self.mode == Mode::Emergency {
            return StatusCode::Emergency;
        }
        let unhealthy = matches!(self.health.latest(), Some(h) if !h.overall());
        if unhealthy {
            return StatusCode::Error;
        }
        if self.fix.is_fixed() {
            StatusCode::FixedOk
        } else {
            StatusCode::WaitingForFix
        }
    }

    /// Startup: load state, reset and initialize the modem, announce
    ///
    /// `self_test_passed` is the verdict of the external boot self-test.
    /// A failed self-test is fatal: one best-effort alert, then the
    /// terminal halt state.
    pub fn startup<T, G, N>(
        &mut self,
        timer: &mut T,
        reset_pin: &mut G,
        nvram: &mut N,
        self_test_passed: bool,
    ) -> LoopAction
    where
        T: TimerInterface,
        G: GpioInterface,
        N: NvramInterface,
    {
        let now = timer.now_ms();
        match Statistics::load(nvram) {
            Ok(stats) => self.stats = stats,
            Err(e) => self.log_error(e.into(), "statistics load failed", now),
        }

        if let Err(e) = self.modem.hard_reset(timer, reset_pin) {
            self.log_error(e.into(), "reset line failure", now);
        }

        let init = self.modem.initialize(timer);

        if !self_test_passed {
            let error = TrackerError::System(SystemError::SelfTestFailed);
            self.log_error(error, "boot self test failed", timer.now_ms());
            if self.modem.is_ready() {
                let body = report::self_test_alert(&self.config, &error);
                self.send_to_contact(timer, body.as_str());
            }
            self.halted = true;
            return LoopAction::Halt;
        }

        match init {
            Ok(()) => self.send_startup_report(timer),
            Err(e) => {
                // Degraded to GPS-only operation; the loop continues
                self.log_error(e, "modem init failed", timer.now_ms());
                log_warn!("continuing without modem");
            }
        }
        LoopAction::Continue
    }

    /// Feed one raw fix sample through validation and the alert checks
    pub fn on_fix_sample<T: TimerInterface>(&mut self, timer: &mut T, sample: FixSample) {
        let now = timer.now_ms();
        let event = match self.fix.offer(sample, now) {
            Ok(event) => event,
            Err(reason) => {
                self.log_error(
                    TrackerError::Gps(GpsError::InvalidSample),
                    reason.as_str(),
                    now,
                );
                return;
            }
        };

        self.stats.note_speed(sample.speed_kmh);
        self.trip.advance(sample.latitude, sample.longitude);

        if self.modem.is_ready()
            && sample.speed_kmh > self.speed_alarm.limit_kmh()
            && self.speed_alarm.check(sample.speed_kmh, now)
        {
            let body =
                report::speed_alert(&self.config, sample.speed_kmh, self.speed_alarm.limit_kmh());
            self.send_to_contact(timer, body.as_str());
        }

        if event == Some(FixEvent::Acquired) {
            log_info!("fix acquired");
            // Immediate report, independent of the normal interval
            self.send_position_report(timer);
        }
    }

    /// External panic trigger: enter Emergency and report immediately
    pub fn trigger_panic<T: TimerInterface>(&mut self, timer: &mut T) {
        log_warn!("panic trigger");
        self.mode = Mode::Emergency;
        if self.fix.is_fixed() {
            self.send_position_report(timer);
        } else {
            self.reply(timer, "EMERGENCY triggered, no fix held");
        }
    }

    /// One cooperative loop iteration
    pub fn step<T, G, N>(&mut self, timer: &mut T, reset_pin: &mut G, nvram: &mut N) -> LoopAction
    where
        T: TimerInterface,
        G: GpioInterface,
        N: NvramInterface,
    {
        if self.halted {
            return LoopAction::Halt;
        }
        let now = timer.now_ms();

        match self.fix.tick(now) {
            Some(FixEvent::Lost) => {
                self.log_error(TrackerError::Gps(GpsError::SignalLost), "fix lost", now);
            }
            Some(FixEvent::AcquisitionTimeout) => {
                self.log_error(
                    TrackerError::Gps(GpsError::AcquisitionTimeout),
                    "no fix within startup window",
                    now,
                );
            }
            _ => {}
        }

        if self.modem.is_ready() {
            self.handle_inbound(timer);
        }

        // Scheduled report: interval is a pure function of the mode
        let interval = self.mode.report_interval_ms();
        if self.modem.is_ready()
            && self.fix.is_fixed()
            && now.saturating_sub(self.last_report_ms) >= interval
        {
            self.send_position_report(timer);
        }

        if self.health.due(now) {
            self.run_health_check(timer, nvram);
        }

        if self.command_failures >= self.config.modem_failure_reset_threshold {
            self.recover_modem(timer, reset_pin);
        }

        self.pending_action.take().unwrap_or(LoopAction::Continue)
    }

    /// Retrieve, dispatch, and delete one inbound message if waiting
    fn handle_inbound<T: TimerInterface>(&mut self, timer: &mut T) {
        let index = match self.modem.poll_notification() {
            Ok(Some(index)) => index,
            Ok(None) => return,
            Err(e) => {
                self.log_error(e, "notification poll failed", timer.now_ms());
                return;
            }
        };

        let verb = match self.modem.read_message(timer, index) {
            Ok(Some(text)) => command::parse(text.as_str()),
            Ok(None) => None,
            Err(e) => {
                self.log_error(e, "message read failed", timer.now_ms());
                None
            }
        };

        // Delete regardless of recognition so the store never fills
        if let Err(e) = self.modem.delete_message(timer, index) {
            self.log_error(e, "message delete failed", timer.now_ms());
        }

        if let Some(verb) = verb {
            self.dispatch(timer, verb);
        }
    }

    /// Map a recognized verb to its state-machine action
    fn dispatch<T: TimerInterface>(&mut self, timer: &mut T, verb: Verb) {
        log_info!("inbound command dispatched");
        match verb {
            Verb::TrackOn => {
                // Idempotent; ignored while Emergency is sticky
                if self.mode == Mode::Normal {
                    self.mode = Mode::Tracking;
                }
                self.reply(timer, "Tracking enabled");
            }
            Verb::TrackOff => {
                if self.mode == Mode::Tracking {
                    self.mode = Mode::Normal;
                }
                self.reply(timer, "Tracking disabled");
            }
            Verb::EmergencyOff => {
                // The only exit from Emergency
                if self.mode == Mode::Emergency {
                    self.mode = Mode::Normal;
                }
                self.reply(timer, "Emergency cleared");
            }
            Verb::Status => {
                let body = report::status_report(
                    &self.config,
                    self.mode,
                    self.fix.current(),
                    &self.stats,
                    self.trip.total_km(),
                    self.error_log.last(),
                );
                self.send_to_contact(timer, body.as_str());
            }
            Verb::Location => self.send_position_or_alert(timer),
            Verb::Test => {
                let modem_alive = matches!(
                    self.modem.execute(timer, "AT", PROBE_TIMEOUT_MS),
                    Ok(reply) if reply.is_ack()
                );
                let body = report::test_report(&self.config, modem_alive, self.fix.is_fixed());
                self.send_to_contact(timer, body.as_str());
            }
            Verb::Help => {
                let body = report::help_text();
                self.send_to_contact(timer, body.as_str());
            }
            Verb::Reboot => {
                self.reply(timer, "Rebooting");
                self.pending_action = Some(LoopAction::Reboot);
            }
        }
    }

    /// Periodic health aggregation, alerting, and statistics persistence
    fn run_health_check<T: TimerInterface, N: NvramInterface>(
        &mut self,
        timer: &mut T,
        nvram: &mut N,
    ) {
        // GPS can only turn unhealthy after a fix has been held once; a
        // receiver still acquiring is not a failure yet
        let gps_healthy = if self.fix.ever_fixed() {
            self.fix.is_fixed()
                && matches!(
                    self.fix.current(),
                    Some(fix) if fix.sample.satellites >= MIN_SATELLITES
                )
        } else {
            true
        };

        let modem_healthy = match self.modem.execute(timer, "AT", PROBE_TIMEOUT_MS) {
            Ok(reply) if reply.is_ack() => true,
            Ok(_) => false,
            Err(e) => {
                self.log_error(e, "health probe failed", timer.now_ms());
                false
            }
        };

        let status = HealthStatus {
            gps_healthy,
            modem_healthy,
        };
        let now = timer.now_ms();
        let became_unhealthy = self.health.record(status, now);

        if became_unhealthy {
            // Compose before logging so the alert carries the error that
            // preceded the failure, not the failure record itself
            let body = report::health_alert(&self.config, &status, self.error_log.last());
            let kind = if !gps_healthy {
                TrackerError::Gps(GpsError::SignalLost)
            } else {
                TrackerError::Modem(ModemError::NoResponse)
            };
            self.log_error(kind, status.failed_subsystem().unwrap_or("health"), now);
            // Bypasses the normal interval gate
            self.send_to_contact(timer, body.as_str());
            // Sustained health failure is an emergency entry condition
            self.mode = Mode::Emergency;
        }

        if let Err(e) = self.stats.save(nvram) {
            self.log_error(e.into(), "statistics save failed", timer.now_ms());
        }
    }

    /// Hard reset and re-init after repeated command failures
    fn recover_modem<T: TimerInterface, G: GpioInterface>(
        &mut self,
        timer: &mut T,
        reset_pin: &mut G,
    ) {
        log_warn!("recovering modem after repeated failures");
        self.command_failures = 0;
        if let Err(e) = self.modem.hard_reset(timer, reset_pin) {
            self.log_error(e.into(), "reset line failure", timer.now_ms());
            return;
        }
        match self.modem.initialize(timer) {
            Ok(()) => self.send_startup_report(timer),
            Err(e) => self.log_error(e, "modem re-init failed", timer.now_ms()),
        }
    }

    /// Send the one-time announcement once the modem is ready
    fn send_startup_report<T: TimerInterface>(&mut self, timer: &mut T) {
        if self.startup_report_sent {
            return;
        }
        let body = report::startup_report(&self.config);
        if self.send_to_contact(timer, body.as_str()) {
            self.startup_report_sent = true;
        }
    }

    /// Scheduled or immediate position report; resets the interval clock
    fn send_position_report<T: TimerInterface>(&mut self, timer: &mut T) {
        let body = match self.fix.current() {
            Some(fix) if fix.valid => report::position_report(&self.config, fix, self.mode),
            _ => return,
        };
        self.last_report_ms = timer.now_ms();
        self.send_to_contact(timer, body.as_str());
    }

    /// Position report when a fix is held, plain alert otherwise
    fn send_position_or_alert<T: TimerInterface>(&mut self, timer: &mut T) {
        if self.fix.is_fixed() {
            self.send_position_report(timer);
        } else {
            self.reply(timer, "No fix available");
        }
    }

    /// Short acknowledgment to the primary contact
    fn reply<T: TimerInterface>(&mut self, timer: &mut T, text: &str) {
        let mut body = ReportText::new();
        let _ = body.push_str(self.config.device_id);
        let _ = body.push_str(": ");
        let _ = body.push_str(text);
        self.send_to_contact(timer, body.as_str());
    }

    /// Submit one message; classify, count, and log failures
    fn send_to_contact<T: TimerInterface>(&mut self, timer: &mut T, body: &str) -> bool {
        if !self.modem.is_ready() {
            return false;
        }
        let now = timer.now_ms();
        match self.modem.send_sms(timer, self.config.primary_contact, body) {
            Ok(AtResponse::Ack(_)) => {
                self.stats.messages_sent = self.stats.messages_sent.saturating_add(1);
                self.command_failures = 0;
                true
            }
            Ok(AtResponse::Timeout) => {
                self.command_failures = self.command_failures.saturating_add(1);
                self.log_error(
                    TrackerError::Messaging(MessagingError::SendTimeout),
                    "send timed out",
                    now,
                );
                false
            }
            Ok(AtResponse::Fail(_)) => {
                self.command_failures = self.command_failures.saturating_add(1);
                self.log_error(
                    TrackerError::Messaging(MessagingError::SendRejected),
                    "send rejected",
                    now,
                );
                false
            }
            Err(e) => {
                self.command_failures = self.command_failures.saturating_add(1);
                self.log_error(e, "send failed", now);
                false
            }
        }
    }

    /// Append to the error log and bump the persisted error counter
    fn log_error(&mut self, kind: TrackerError, message: &str, now_ms: u64) {
        log_warn!("{} error: {}", kind.category(), message);
        self.error_log.append(kind, message, now_ms);
        self.stats.error_count = self.stats.error_count.saturating_add(1);
    }
}
