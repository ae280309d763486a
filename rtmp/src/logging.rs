//! The publisher does not own a log sink.  Whoever constructs it hands in a [`Logger`], and
//! the publisher reports its operational events (connect failures, handshake failures,
//! reconnect attempts, rejections) through it.
//!
//! [`LogCrateLogger`] forwards everything to the `log` facade so any `log` compatible backend
//! (e.g. `env_logger`) can be used.

use std::fmt;

/// Severity of a log entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,

    /// An unrecoverable condition that is about to end the publish
    Fatal,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        };

        f.write_str(name)
    }
}

/// A sink for log entries.  Implementations must tolerate being called from more than one
/// thread, as the same sink is commonly shared with the rest of the application.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Forwards log entries to the `log` crate under the `flvcast` target
#[derive(Clone, Copy, Debug, Default)]
pub struct LogCrateLogger;

const LOG_TARGET: &str = "flvcast";

impl Logger for LogCrateLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Trace => log::trace!(target: LOG_TARGET, "{}", message),
            LogLevel::Debug => log::debug!(target: LOG_TARGET, "{}", message),
            LogLevel::Info => log::info!(target: LOG_TARGET, "{}", message),
            LogLevel::Warn => log::warn!(target: LOG_TARGET, "{}", message),
            LogLevel::Error => log::error!(target: LOG_TARGET, "{}", message),
            LogLevel::Fatal => log::error!(target: LOG_TARGET, "FATAL: {}", message),
        }
    }
}
