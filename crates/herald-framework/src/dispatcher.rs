//! The dispatcher: from raw message text to an invoked command.
//!
//! ```text
//! handle_incoming(text, actor, channel)
//!   │
//!   ├─ 1. match       prefix + command word → descriptor   (miss: Ignored)
//!   ├─ 2. guards      owner / guild / permissions / roles  (GuardDenied)
//!   ├─ 3. rate limit  per (command, actor) window          (RateLimited)
//!   ├─ 4. tokenize    one token per declared argument      (UsageError)
//!   ├─ 5. middleware  resolve, expect, custom, localize    (middleware error)
//!   └─ 6. invoke      action; errors and panics caught     (InternalActionError)
//! ```
//!
//! Every failure except a miss is rendered into one message, sent to the
//! originating channel and returned in the [`Outcome`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::timeout;
use tracing::{Instrument, Level, debug, info, span, warn};

use herald_core::{
    Actor, BoxedLocalizer, BoxedLogSink, BoxedLookup, BoxedResponder, BoxedSettings,
    ChannelContext, LogLevel, SettingScope, UserId, get_setting,
};

use crate::command::{
    BoxedAction, CommandAction, CommandDescriptor, CommandRegistry, into_action, normalize,
    split_invocation, tokenize,
};
use crate::context::{InvocationContext, Services};
use crate::error::{DispatchError, RegistrationError, TokenizeError};
use crate::guard::check_guards;
use crate::ratelimit::{Admission, DEFAULT_SWEEP_INTERVAL, RateLimiter};
use crate::resolver::{Resolver, ResolverRegistry};
use crate::service::DispatchService;
use crate::strings::BaseStrings;
use crate::value::Arguments;

/// Guild setting overriding the command prefix.
pub const PREFIX_KEY: &str = "prefix";
/// Guild setting overriding the language.
pub const LANG_KEY: &str = "lang";

// =============================================================================
// Configuration
// =============================================================================

/// Static dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Prefix used when a guild sets none.
    pub prefix: String,
    /// Users passing every owner check.
    pub owners: Vec<UserId>,
    /// Language used when a guild sets none.
    pub default_lang: String,
    /// Upper bound for a single collaborator call: entity lookups, setting
    /// reads and failure replies.
    pub lookup_timeout: Duration,
    /// Send rendered failures back to the channel.
    pub reply_errors: bool,
    /// Rate-limit checks between sweeps, `0` to disable.
    pub sweep_interval: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            owners: Vec::new(),
            default_lang: "en".to_string(),
            lookup_timeout: Duration::from_secs(5),
            reply_errors: true,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// Result of handling one message.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The message did not invoke a command.
    Ignored,
    /// The action ran to completion.
    Completed { command: String },
    /// The invocation stopped at `error`; `reply` is the rendered message.
    Failed {
        command: String,
        error: DispatchError,
        reply: Option<String>,
    },
}

impl Outcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn error(&self) -> Option<&DispatchError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Matches messages to commands and runs them.
///
/// Commands are registered through `&mut self` before the dispatcher is
/// shared; once wrapped in an `Arc` the registries are read-only and only the
/// rate limiter changes. Invocations see the command registry through their
/// context; registering while a context is alive copies the registry.
pub struct Dispatcher {
    config: DispatcherConfig,
    commands: Arc<CommandRegistry>,
    limiter: RateLimiter,
    services: Arc<Services>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// Registers a command with its action.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::UnknownTypeTag`] when an argument names a type
    /// no resolver is bound to, plus every error of
    /// [`CommandRegistry::register`].
    pub fn register<A: CommandAction>(
        &mut self,
        descriptor: CommandDescriptor,
        action: A,
    ) -> Result<(), RegistrationError> {
        self.register_boxed(descriptor, into_action(action))
    }

    /// [`register`](Self::register) for an already boxed action.
    pub fn register_boxed(
        &mut self,
        descriptor: CommandDescriptor,
        action: BoxedAction,
    ) -> Result<(), RegistrationError> {
        for spec in descriptor.arguments() {
            if let Some(tag) = spec.type_tag()
                && !self.services.resolvers.contains(tag)
            {
                return Err(RegistrationError::UnknownTypeTag {
                    command: descriptor.name().to_string(),
                    argument: spec.name.clone(),
                    tag: tag.to_string(),
                });
            }
        }
        Arc::make_mut(&mut self.commands).register(descriptor, action)
    }

    /// Removes a command. Returns `false` if it was not registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        let removed = Arc::make_mut(&mut self.commands).unregister(name);
        if let Some(command) = &removed {
            self.limiter.sweep();
            debug!(command = %command.descriptor.name(), "Command removed from dispatcher");
        }
        removed.is_some()
    }

    /// Wraps the dispatcher in a [`tower::Service`].
    pub fn into_service(self) -> DispatchService {
        DispatchService::new(Arc::new(self))
    }

    /// Handles one message end to end.
    pub async fn handle_incoming(
        &self,
        raw_text: &str,
        actor: Actor,
        channel: ChannelContext,
    ) -> Outcome {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            actor = %actor.id,
            channel = %channel.channel_id,
            guild = ?channel.guild_id.as_ref().map(|g| g.as_str()),
        );
        self.dispatch(raw_text, actor, channel).instrument(span).await
    }

    async fn dispatch(&self, raw_text: &str, actor: Actor, channel: ChannelContext) -> Outcome {
        let prefix = self
            .guild_setting(&channel, PREFIX_KEY)
            .await
            .unwrap_or_else(|| self.config.prefix.clone());

        let body = match raw_text.trim_start().strip_prefix(prefix.as_str()) {
            Some(body) => body,
            // the prefix is optional in direct messages
            None if channel.is_direct() => raw_text,
            None => return Outcome::Ignored,
        };
        let Some((word, rest)) = split_invocation(body) else {
            return Outcome::Ignored;
        };
        let Some(command) = self.commands.find(word) else {
            debug!(word, "No command matched");
            return Outcome::Ignored;
        };

        let lang = self
            .guild_setting(&channel, LANG_KEY)
            .await
            .unwrap_or_else(|| self.config.default_lang.clone());

        let ctx = Arc::new(
            InvocationContext::new(
                actor,
                channel,
                Arc::clone(&command.descriptor),
                Arc::clone(&self.services),
            )
            .with_invoked_as(normalize(word))
            .with_prefix(prefix)
            .with_lang(lang)
            .with_raw_args(rest.trim())
            .with_commands(Arc::clone(&self.commands)),
        );
        let name = ctx.command().name().to_string();
        debug!(command = %name, invoked_as = %ctx.invoked_as(), "Command matched");

        match self.run(&ctx, &command.action).await {
            Ok(()) => {
                info!(command = %name, actor = %ctx.actor().id, "Command completed");
                Outcome::Completed { command: name }
            }
            Err(error) => self.fail(&ctx, error).await,
        }
    }

    /// Steps 2 to 6; the first failure ends the invocation.
    async fn run(
        &self,
        ctx: &Arc<InvocationContext>,
        action: &BoxedAction,
    ) -> Result<(), DispatchError> {
        let descriptor = ctx.command();

        check_guards(
            descriptor,
            ctx.actor(),
            ctx.channel(),
            &self.config.owners,
            self.services.settings.as_ref(),
            self.config.lookup_timeout,
        )
        .await
        .map_err(DispatchError::GuardDenied)?;

        if let Admission::Deny { retry_after } = self.limiter.check_and_record(
            descriptor.name(),
            &ctx.actor().id,
            descriptor.rate_limit(),
        ) {
            return Err(DispatchError::RateLimited { retry_after });
        }

        let tokens = tokenize(ctx.raw_args(), descriptor.arguments())
            .map_err(|e| usage_error(ctx, e))?;

        let args = descriptor
            .middleware()
            .run(ctx, Arguments::new(tokens))
            .await?;

        self.invoke(ctx, action, args).await
    }

    /// Runs the action, turning errors and panics into
    /// [`DispatchError::InternalActionError`] after logging the detail.
    async fn invoke(
        &self,
        ctx: &Arc<InvocationContext>,
        action: &BoxedAction,
        args: Arguments,
    ) -> Result<(), DispatchError> {
        let started = std::panic::catch_unwind(AssertUnwindSafe(|| {
            action.call(Arc::clone(ctx), args)
        }));
        let finished = match started {
            Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
            Err(panic) => Err(panic),
        };

        let cause = match finished {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => e.to_string(),
            Err(panic) => format!("panicked: {}", panic_message(panic.as_ref())),
        };

        let actor = ctx.actor();
        self.services.log.emit(
            LogLevel::Error,
            &format!("Command:{}", ctx.command().name()),
            &format!(
                "{} ({}) ran `{}{} {}` in {}: {cause}",
                actor.name,
                actor.id,
                ctx.prefix(),
                ctx.invoked_as(),
                ctx.raw_args(),
                ctx.channel().channel_id,
            ),
        );
        Err(DispatchError::InternalActionError(cause))
    }

    async fn fail(&self, ctx: &InvocationContext, error: DispatchError) -> Outcome {
        let command = ctx.command().name().to_string();
        debug!(command = %command, kind = error.kind(), error = %error, "Invocation failed");

        let reply = error.render(&ctx.resources(), &command);
        if self.config.reply_errors
            && let Some(text) = &reply
        {
            // send failures are logged by the context
            if timeout(self.config.lookup_timeout, ctx.reply(text)).await.is_err() {
                warn!(
                    command = %command,
                    timeout = ?self.config.lookup_timeout,
                    "Gave up sending failure reply"
                );
            }
        }

        Outcome::Failed {
            command,
            error,
            reply,
        }
    }

    /// A non-empty string setting of the channel's guild. Unreadable or slow
    /// settings count as unset.
    async fn guild_setting(&self, channel: &ChannelContext, key: &str) -> Option<String> {
        let guild = channel.guild_id.as_ref()?;
        let scope = SettingScope::Guild(guild.clone());
        let read = get_setting::<String>(self.services.settings.as_ref(), &scope, key);
        match timeout(self.config.lookup_timeout, read).await {
            Ok(Ok(value)) => value.filter(|v| !v.is_empty()),
            Ok(Err(e)) => {
                warn!(guild = %guild, key, error = %e, "Ignoring unreadable setting");
                None
            }
            Err(_) => {
                warn!(
                    guild = %guild,
                    key,
                    timeout = ?self.config.lookup_timeout,
                    "Setting read timed out, using the default"
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("commands", &self.commands.len())
            .field("limiter", &self.limiter)
            .field("services", &self.services)
            .finish()
    }
}

fn usage_error(ctx: &InvocationContext, error: TokenizeError) -> DispatchError {
    let TokenizeError::ArgumentCountMismatch { expected, got } = error;
    let (expected, got) = (expected.to_string(), got.to_string());
    let detail = ctx.resources().get_with(
        BaseStrings::ARGUMENT_COUNT,
        &[("expected", expected.as_str()), ("got", got.as_str())],
    );
    DispatchError::UsageError {
        detail,
        usage: ctx.usage(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Dispatcher`].
///
/// Collaborators not provided fall back to the defaults of
/// [`Services::new`].
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    resolvers: ResolverRegistry,
    lookup: Option<BoxedLookup>,
    settings: Option<BoxedSettings>,
    localizer: Option<BoxedLocalizer>,
    log: Option<BoxedLogSink>,
    responder: Option<BoxedResponder>,
    error: Option<RegistrationError>,
}

impl DispatcherBuilder {
    /// A builder with the built-in resolvers and default configuration.
    pub fn new() -> Self {
        Self {
            config: DispatcherConfig::default(),
            resolvers: ResolverRegistry::with_builtins(),
            lookup: None,
            settings: None,
            localizer: None,
            log: None,
            responder: None,
            error: None,
        }
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    pub fn owner(mut self, id: impl Into<UserId>) -> Self {
        self.config.owners.push(id.into());
        self
    }

    pub fn default_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.default_lang = lang.into();
        self
    }

    pub fn lookup_timeout(mut self, timeout: Duration) -> Self {
        self.config.lookup_timeout = timeout;
        self
    }

    pub fn reply_errors(mut self, reply: bool) -> Self {
        self.config.reply_errors = reply;
        self
    }

    /// Replaces the resolver registry, built-ins included.
    pub fn resolvers(mut self, resolvers: ResolverRegistry) -> Self {
        self.resolvers = resolvers;
        self
    }

    /// Adds a resolver; a duplicate tag is reported by [`build`](Self::build).
    pub fn resolver<R: Resolver + 'static>(mut self, tag: impl Into<String>, resolver: R) -> Self {
        if let Err(e) = self.resolvers.register(tag, resolver) {
            self.error.get_or_insert(e);
        }
        self
    }

    pub fn lookup(mut self, lookup: BoxedLookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn settings(mut self, settings: BoxedSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn localizer(mut self, localizer: BoxedLocalizer) -> Self {
        self.localizer = Some(localizer);
        self
    }

    pub fn log_sink(mut self, log: BoxedLogSink) -> Self {
        self.log = Some(log);
        self
    }

    pub fn responder(mut self, responder: BoxedResponder) -> Self {
        self.responder = Some(responder);
        self
    }

    pub fn build(self) -> Result<Dispatcher, RegistrationError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let mut services = Services::new(self.resolvers);
        services.lookup_timeout = self.config.lookup_timeout;
        services.localizer = self.localizer;
        if let Some(lookup) = self.lookup {
            services.lookup = lookup;
        }
        if let Some(settings) = self.settings {
            services.settings = settings;
        }
        if let Some(log) = self.log {
            services.log = log;
        }
        if let Some(responder) = self.responder {
            services.responder = responder;
        }

        debug!(
            prefix = %self.config.prefix,
            owners = self.config.owners.len(),
            resolvers = ?services.resolvers.tags(),
            "Dispatcher built"
        );

        Ok(Dispatcher {
            limiter: RateLimiter::with_sweep_interval(self.config.sweep_interval),
            config: self.config,
            commands: Arc::default(),
            services: Arc::new(services),
        })
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
