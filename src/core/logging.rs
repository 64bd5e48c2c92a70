//! Logging abstraction
//!
//! Provides unified logging macros that work across different targets:
//! - Embedded (`defmt` feature): routed to defmt
//! - Host tests: `println!` / `eprintln!`
//! - Host non-test: no-op
//!
//! Keep format strings simple (`{}` with primitives and `&str`) so the
//! same call sites are valid under both defmt and core::fmt.

/// Log debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[DEBUG] {}", ::core::format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        { let _ = ::core::format_args!($($arg)*); }
    }};
}

/// Log informational message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[INFO] {}", ::core::format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        { let _ = ::core::format_args!($($arg)*); }
    }};
}

/// Log warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[WARN] {}", ::core::format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        { let _ = ::core::format_args!($($arg)*); }
    }};
}

/// Log error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        eprintln!("[ERROR] {}", ::core::format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        { let _ = ::core::format_args!($($arg)*); }
    }};
}
