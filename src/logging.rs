//! Logging shims for the navigator and the dialog host.
//!
//! The crate logs through `log` by default and through `tracing` when that
//! feature is enabled. With neither feature the macros expand to
//! nothing, so call sites never carry their own `cfg` attributes.
//!
//! Level conventions used across the crate:
//!
//! - `trace`: route resolution and cache lookups.
//! - `debug`: each hook decision and each dialog opened or closed.
//! - `info`: committed navigations.
//! - `warn`: vetoes, after hook failures, dialogs that fail to open.
//! - `error`: redirect loops.
//!
//! ```ignore
//! debug_log!("Hook '{}' proceeded for '{}'", hook, key);
//! warn_log!("Navigation to '{}' vetoed: {}", key, reason);
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! __nav_log {
    ($level:ident, $($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::$level!($($arg)*);
        #[cfg(feature = "log")]
        ::log::$level!($($arg)*);
    };
}

/// Log a trace-level message with `format!`-style arguments.
///
/// Forwards to `trace!` of each enabled backend.
/// Used for route resolution, cache hits and misses.
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => { $crate::__nav_log!(trace, $($arg)*) };
}

/// Log a debug-level message with `format!`-style arguments.
///
/// Forwards to `debug!` of each enabled backend.
/// Used for hook decisions and dialogs opening or closing.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => { $crate::__nav_log!(debug, $($arg)*) };
}

/// Log an info-level message with `format!`-style arguments.
///
/// Forwards to `info!` of each enabled backend.
/// Used for committed navigations.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => { $crate::__nav_log!(info, $($arg)*) };
}

/// Log a warn-level message with `format!`-style arguments.
///
/// Forwards to `warn!` of each enabled backend.
/// Used for vetoes, after hook failures and ignored deadlines.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => { $crate::__nav_log!(warn, $($arg)*) };
}

/// Log an error-level message with `format!`-style arguments.
///
/// Forwards to `error!` of each enabled backend.
/// Used for redirect loops.
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => { $crate::__nav_log!(error, $($arg)*) };
}
