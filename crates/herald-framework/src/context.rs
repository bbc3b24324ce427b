//! Per-invocation context and shared services.
//!
//! ```text
//! Dispatcher ──owns──▶ Arc<Services> ◀──shares── InvocationContext (one per call)
//!                          │
//!                          ├─ lookup / settings / localizer / log / responder
//!                          └─ resolver registry, lookup timeout
//! ```
//!
//! A context also holds the dispatcher's command registry, so management
//! commands can look other commands up.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use herald_core::{
    Actor, BoxedLocalizer, BoxedLogSink, BoxedLookup, BoxedResponder, BoxedSettings,
    ChannelContext, GuildId, MemorySettings, NullLookup, NullResponder, TracingLogSink,
};

use crate::command::{CommandDescriptor, CommandRegistry};
use crate::resolver::ResolverRegistry;
use crate::strings::ResourceLoader;

// =============================================================================
// Services
// =============================================================================

/// Read-only collaborators shared by every invocation.
#[derive(Clone)]
pub struct Services {
    pub lookup: BoxedLookup,
    pub settings: BoxedSettings,
    pub localizer: Option<BoxedLocalizer>,
    pub log: BoxedLogSink,
    pub responder: BoxedResponder,
    pub resolvers: Arc<ResolverRegistry>,
    /// Upper bound for a single entity lookup.
    pub lookup_timeout: Duration,
}

impl Services {
    /// Services backed by in-process defaults: no entities, in-memory
    /// settings, English strings, `tracing` logs and a reply sink that drops
    /// everything.
    pub fn new(resolvers: ResolverRegistry) -> Self {
        Self {
            lookup: Arc::new(NullLookup),
            settings: Arc::new(MemorySettings::new()),
            localizer: None,
            log: Arc::new(TracingLogSink),
            responder: Arc::new(NullResponder),
            resolvers: Arc::new(resolvers),
            lookup_timeout: Duration::from_secs(5),
        }
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("resolvers", &self.resolvers)
            .field("localized", &self.localizer.is_some())
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// InvocationContext
// =============================================================================

/// Everything known about one invocation of a matched command.
///
/// Owned by a single dispatcher call; actions receive it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    actor: Actor,
    channel: ChannelContext,
    command: Arc<CommandDescriptor>,
    invoked_as: String,
    prefix: String,
    lang: String,
    raw_args: String,
    services: Arc<Services>,
    commands: Arc<CommandRegistry>,
}

impl InvocationContext {
    /// Creates a context invoked by the command's own name, with an empty
    /// prefix, English language and no arguments.
    pub fn new(
        actor: Actor,
        channel: ChannelContext,
        command: Arc<CommandDescriptor>,
        services: Arc<Services>,
    ) -> Self {
        Self {
            invoked_as: command.name().to_string(),
            actor,
            channel,
            command,
            prefix: String::new(),
            lang: "en".to_string(),
            raw_args: String::new(),
            services,
            commands: Arc::default(),
        }
    }

    pub fn with_invoked_as(mut self, alias: impl Into<String>) -> Self {
        self.invoked_as = alias.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_raw_args(mut self, raw: impl Into<String>) -> Self {
        self.raw_args = raw.into();
        self
    }

    pub fn with_commands(mut self, commands: Arc<CommandRegistry>) -> Self {
        self.commands = commands;
        self
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn channel(&self) -> &ChannelContext {
        &self.channel
    }

    /// Guild of the originating channel, `None` in direct messages.
    pub fn guild_id(&self) -> Option<&GuildId> {
        self.channel.guild_id.as_ref()
    }

    pub fn command(&self) -> &Arc<CommandDescriptor> {
        &self.command
    }

    /// The name or alias the actor typed, normalized.
    pub fn invoked_as(&self) -> &str {
        &self.invoked_as
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Argument text after the command word.
    pub fn raw_args(&self) -> &str {
        &self.raw_args
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// Commands registered with the dispatcher handling this invocation.
    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// String loader for the invocation language.
    pub fn resources(&self) -> ResourceLoader {
        ResourceLoader::new(self.lang.clone(), self.services.localizer.clone())
    }

    /// The command's usage line with the prefix in effect substituted.
    pub fn usage(&self) -> String {
        self.command.usage_with_prefix(&self.prefix)
    }

    /// Sends `text` back to the originating channel.
    pub async fn reply(&self, text: &str) -> Result<(), herald_core::ResponderError> {
        let result = self.services.responder.send(&self.channel, text).await;
        if let Err(e) = &result {
            warn!(command = %self.command.name(), error = %e, "Failed to send reply");
        }
        result
    }
}
