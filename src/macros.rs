//! Logging macros with `format!`-style interpolation.
//!
//! # Examples
//!
//! ```
//! use resilog::prelude::*;
//! use resilog::{info, warn};
//! use std::sync::Arc;
//!
//! let logger = Logger::new(Arc::new(RingBufferHandler::default()));
//!
//! info!(logger, "server started");
//!
//! let port = 8080;
//! info!(logger, "listening on port {}", port);
//! warn!(logger, "retry {} of {}", 1, 3);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use resilog::prelude::*;
/// # use std::sync::Arc;
/// # let logger = Logger::new(Arc::new(RingBufferHandler::default()));
/// use resilog::log;
/// log!(logger, Level::Info, "simple message");
/// log!(logger, Level::Error, "error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}
