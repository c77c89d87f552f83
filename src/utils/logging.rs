//! Logging macros gated on a module-level `ENABLE_LOGS` constant.
//!
//! Used by the hot polling path so its chatter can be silenced per module
//! without touching the global filter:
//!
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! use crate::{log_debug, log_error, log_info};
//!
//! log_info!("collector polling feed every {}s", 30);
//! ```

/// `log::info!` when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// `log::debug!` when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// `log::error!` when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
