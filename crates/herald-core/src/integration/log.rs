//! Operator-facing log output.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        })
    }
}

/// Fire-and-forget log output, injected into the dispatcher.
///
/// `tag` names the emitting component, e.g. `"Command:ban"`.
pub trait LogSink: Send + Sync {
    fn emit(&self, level: LogLevel, tag: &str, text: &str);
}

/// Shared handle to a log sink.
pub type BoxedLogSink = Arc<dyn LogSink>;

/// Forwards log lines to `tracing` with the tag as a field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn emit(&self, level: LogLevel, tag: &str, text: &str) {
        match level {
            LogLevel::Error => error!(tag, "{text}"),
            LogLevel::Warn => warn!(tag, "{text}"),
            LogLevel::Info => info!(tag, "{text}"),
            LogLevel::Debug => debug!(tag, "{text}"),
            LogLevel::Trace => trace!(tag, "{text}"),
        }
    }
}
