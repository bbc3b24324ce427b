//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use herald_core::UserId;
use herald_framework::DispatcherConfig;
use herald_framework::ratelimit::DEFAULT_SWEEP_INTERVAL;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HeraldConfig {
    /// Command dispatch settings.
    #[serde(default)]
    pub dispatcher: DispatcherSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Dispatcher settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatcherSettings {
    /// Prefix used when a guild sets none.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// User IDs passing every owner check.
    #[serde(default)]
    pub owners: Vec<String>,

    /// Language used when a guild sets none.
    #[serde(default = "default_lang")]
    pub default_lang: String,

    /// Upper bound for a single entity lookup in milliseconds.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,

    /// Send rendered failures back to the channel.
    #[serde(default = "default_reply_errors")]
    pub reply_errors: bool,

    /// Rate-limit checks between sweeps of idle entries, `0` to disable.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: u64,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            owners: Vec::new(),
            default_lang: default_lang(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            reply_errors: default_reply_errors(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

impl DispatcherSettings {
    /// Converts to the framework's dispatcher config.
    pub fn to_dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            prefix: self.prefix.clone(),
            owners: self.owners.iter().map(UserId::new).collect(),
            default_lang: self.default_lang.clone(),
            lookup_timeout: Duration::from_millis(self.lookup_timeout_ms),
            reply_errors: self.reply_errors,
            sweep_interval: self.sweep_interval,
        }
    }
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_lookup_timeout_ms() -> u64 {
    5000
}

fn default_reply_errors() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    DEFAULT_SWEEP_INTERVAL
}

// =============================================================================
// Logging
// =============================================================================

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Global level; `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread IDs.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include file names and line numbers.
    #[serde(default)]
    pub file_location: bool,

    /// Log file for [`LogOutput::File`].
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// How often the log file rolls over.
    #[serde(default)]
    pub rotation: LogRotation,

    /// Rolled files kept on disk.
    #[serde(default = "default_max_files")]
    pub max_files: u32,

    /// Per-target levels, e.g. `herald_framework = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            file_path: None,
            rotation: LogRotation::default(),
            max_files: default_max_files(),
            filters: BTreeMap::new(),
        }
    }
}

fn default_max_files() -> u32 {
    5
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Log file rollover period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Span lifecycle events to log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}
