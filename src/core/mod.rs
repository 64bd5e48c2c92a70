//! Core tracker infrastructure
//!
//! This module contains the fundamental pieces shared by the device
//! drivers and the tracker loop: the error taxonomy, the bounded error
//! log, persisted statistics, deadline handling, and logging macros.

pub mod error;
pub mod error_log;
pub mod logging;
pub mod stats;
pub mod timing;
