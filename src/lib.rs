#![cfg_attr(not(test), no_std)]

//! trail_beacon - vehicle-mounted GPS tracker core
//!
//! This library provides the control logic of a GPS tracking beacon: fix
//! acquisition and validation, an AT command channel driving a GSM modem,
//! SMS position reporting, remote command handling, and a mode/alerting
//! state machine with health monitoring.
//!
//! Hardware access goes through the platform abstraction traits so the
//! whole core runs against mock peripherals on the host.

// The mock platform is host-only and needs std even in no_std builds
#[cfg(feature = "mock")]
extern crate std;

// Platform abstraction layer (UART, GPIO, timer, NVRAM)
pub mod platform;

// Device drivers using platform abstraction
pub mod devices;

// Core infrastructure (errors, error log, statistics, timing, logging)
pub mod core;

// Tracker state machine and control loop
pub mod tracker;
