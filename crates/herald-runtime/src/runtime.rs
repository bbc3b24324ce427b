//! The message loop around a configured dispatcher.
//!
//! The runtime loads configuration, initializes logging, builds the
//! [`Dispatcher`] with the embedding application's collaborators, then feeds
//! it messages from any stream, one task per message.
//!
//! ```rust,ignore
//! use herald_runtime::HeraldRuntime;
//!
//! let mut runtime = HeraldRuntime::builder()
//!     .config_file("herald.toml")
//!     .responder(Arc::new(MyResponder))
//!     .lookup(Arc::new(MyLookup))
//!     .build()?;
//!
//! runtime.register(ping_descriptor, ping)?;
//!
//! // Until the stream ends or Ctrl+C
//! let stats = runtime.run(incoming_messages).await;
//! ```

use std::future::Future;
use std::path::Path;
use std::pin::pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::signal;
use tokio::task::JoinSet;
use tower::ServiceExt;
use tracing::{debug, error, info, warn};

use herald_core::{BoxedLocalizer, BoxedLogSink, BoxedLookup, BoxedResponder, BoxedSettings};
use herald_framework::{
    CommandAction, CommandDescriptor, DispatchService, Dispatcher, DispatcherBuilder, Incoming,
    Outcome, Resolver, ResolverRegistry,
};

use crate::config::{ConfigLoader, HeraldConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;

/// Counters for one [`HeraldRuntime::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Messages taken from the stream.
    pub received: u64,
    /// Messages that did not invoke a command.
    pub ignored: u64,
    pub completed: u64,
    pub failed: u64,
    /// Dispatch tasks that panicked or were cancelled.
    pub aborted: u64,
}

impl RuntimeStats {
    fn record(&mut self, joined: Result<Outcome, tokio::task::JoinError>) {
        match joined {
            Ok(Outcome::Ignored) => self.ignored += 1,
            Ok(Outcome::Completed { .. }) => self.completed += 1,
            Ok(Outcome::Failed { .. }) => self.failed += 1,
            Err(e) => {
                error!(error = %e, "Dispatch task aborted");
                self.aborted += 1;
            }
        }
    }
}

/// A configured dispatcher plus the loop that feeds it.
pub struct HeraldRuntime {
    config: HeraldConfig,
    dispatcher: Dispatcher,
}

impl HeraldRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// A runtime with default collaborators.
    pub fn from_config(config: &HeraldConfig) -> RuntimeResult<Self> {
        assemble(Dispatcher::builder(), config.clone())
    }

    pub fn config(&self) -> &HeraldConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Registers a command. See [`Dispatcher::register`].
    pub fn register<A: CommandAction>(
        &mut self,
        descriptor: CommandDescriptor,
        action: A,
    ) -> RuntimeResult<()> {
        let name = descriptor.name().to_string();
        self.dispatcher.register(descriptor, action)?;
        debug!(command = %name, "Registered command");
        Ok(())
    }

    /// Registers the `limit` and `clearlimit` role-limit commands.
    pub fn register_limit_commands(&mut self) -> RuntimeResult<()> {
        self.dispatcher.register_limit_commands()?;
        Ok(())
    }

    /// Runs until the stream ends or a shutdown signal arrives.
    pub async fn run<S>(self, messages: S) -> RuntimeStats
    where
        S: Stream<Item = Incoming>,
    {
        info!("Herald runtime is now running. Press Ctrl+C to stop.");
        self.run_until(messages, wait_for_shutdown()).await
    }

    /// Runs until the stream ends or `shutdown` completes, then waits for
    /// in-flight invocations.
    pub async fn run_until<S, F>(self, messages: S, shutdown: F) -> RuntimeStats
    where
        S: Stream<Item = Incoming>,
        F: Future<Output = ()>,
    {
        let service = DispatchService::new(Arc::new(self.dispatcher));
        let mut messages = pin!(messages);
        let mut shutdown = pin!(shutdown);
        let mut tasks = JoinSet::new();
        let mut stats = RuntimeStats::default();

        info!(
            commands = service.dispatcher().commands().len(),
            prefix = %self.config.dispatcher.prefix,
            "Runtime started"
        );

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                next = messages.next() => match next {
                    Some(incoming) => {
                        stats.received += 1;
                        let service = service.clone();
                        tasks.spawn(async move {
                            match service.oneshot(incoming).await {
                                Ok(outcome) => outcome,
                                Err(never) => match never {},
                            }
                        });
                    }
                    None => {
                        debug!("Message stream ended");
                        break;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => stats.record(joined),
            }
        }

        if !tasks.is_empty() {
            debug!(in_flight = tasks.len(), "Waiting for running invocations");
        }
        while let Some(joined) = tasks.join_next().await {
            stats.record(joined);
        }

        info!(
            received = stats.received,
            completed = stats.completed,
            failed = stats.failed,
            "Runtime stopped"
        );
        stats
    }
}

impl std::fmt::Debug for HeraldRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeraldRuntime")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

/// Completes on Ctrl+C or SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Cannot listen for SIGTERM"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!(error = %e, "Cannot listen for Ctrl+C; running until the stream ends");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`HeraldRuntime`].
///
/// Configuration comes from the [`ConfigLoader`]; collaborators not given
/// here fall back to the dispatcher defaults.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    dispatcher: DispatcherBuilder,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            dispatcher: Dispatcher::builder(),
        }
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration programmatically.
    pub fn merge(mut self, config: HeraldConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    pub fn lookup(mut self, lookup: BoxedLookup) -> Self {
        self.dispatcher = self.dispatcher.lookup(lookup);
        self
    }

    pub fn settings(mut self, settings: BoxedSettings) -> Self {
        self.dispatcher = self.dispatcher.settings(settings);
        self
    }

    pub fn localizer(mut self, localizer: BoxedLocalizer) -> Self {
        self.dispatcher = self.dispatcher.localizer(localizer);
        self
    }

    pub fn log_sink(mut self, log: BoxedLogSink) -> Self {
        self.dispatcher = self.dispatcher.log_sink(log);
        self
    }

    pub fn responder(mut self, responder: BoxedResponder) -> Self {
        self.dispatcher = self.dispatcher.responder(responder);
        self
    }

    pub fn resolver<R: Resolver + 'static>(mut self, tag: impl Into<String>, resolver: R) -> Self {
        self.dispatcher = self.dispatcher.resolver(tag, resolver);
        self
    }

    pub fn resolvers(mut self, resolvers: ResolverRegistry) -> Self {
        self.dispatcher = self.dispatcher.resolvers(resolvers);
        self
    }

    /// Loads and validates configuration, initializes logging and builds the
    /// dispatcher.
    pub fn build(self) -> RuntimeResult<HeraldRuntime> {
        let config = self.config_loader.load()?;
        assemble(self.dispatcher, config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn assemble(dispatcher: DispatcherBuilder, config: HeraldConfig) -> RuntimeResult<HeraldRuntime> {
    validate_config(&config)?;
    logging::init_from_config(&config.logging);

    let dispatcher = dispatcher
        .config(config.dispatcher.to_dispatcher_config())
        .build()?;

    info!(
        log_level = %config.logging.level,
        log_format = ?config.logging.format,
        prefix = %config.dispatcher.prefix,
        "Runtime initialized from configuration"
    );

    Ok(HeraldRuntime { config, dispatcher })
}
