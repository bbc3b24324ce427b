//! Herald Runtime - configuration, logging and the message loop.
//!
//! This crate provides:
//! - Layered configuration loading ([`ConfigLoader`]) and validation
//! - Logging setup on `tracing-subscriber` ([`LoggingBuilder`])
//! - [`HeraldRuntime`], which builds the dispatcher from configuration and
//!   feeds it a stream of incoming messages until shutdown
//!
//! ```ignore
//! use herald_runtime::HeraldRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut runtime = HeraldRuntime::builder()
//!         .responder(Arc::new(ConsoleResponder))
//!         .build()?;
//!
//!     runtime.register(ping(), ping_action)?;
//!     runtime.run(messages).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{
    ConfigLoader, DispatcherSettings, HeraldConfig, LoggingConfig, load_config,
    load_config_from_file, validate_config,
};
pub use error::{ConfigError, ConfigResult, RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{HeraldRuntime, RuntimeBuilder, RuntimeStats};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for command implementations.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
