//! Command descriptors.
//!
//! A [`CommandDescriptor`] is the static description of a command: its name
//! and aliases, argument declaration, guards, rate limit and the ordered
//! middleware list. Descriptors are assembled with [`DescriptorBuilder`] and
//! never change after registration.
//!
//! # Example
//!
//! ```rust,ignore
//! let descriptor = CommandDescriptor::builder("ban")
//!     .alias("b")
//!     .describe("Bans a member")
//!     .arguments("<member>: Member, [...reason]: String")
//!     .guild_only()
//!     .permission(Permission::BanMembers)
//!     .ratelimit("2/10s")
//!     .resolve()
//!     .expect()
//!     .localize()
//!     .build()?;
//! ```

use std::sync::Arc;

use herald_core::{Permission, PermissionSet};

use crate::error::RegistrationError;
use crate::middleware::{self, Middleware, MiddlewareChain};
use crate::ratelimit::RateLimitPolicy;
use crate::value::Arguments;

use super::registry::normalize;
use super::signature::{ArgSpec, check_signature, parse_signature};

/// Static preconditions checked before rate limiting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guards {
    pub owner_only: bool,
    pub guild_only: bool,
    /// Checked in guild channels only.
    pub permissions: PermissionSet,
}

/// Static metadata of one command.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    name: String,
    aliases: Vec<String>,
    usage: Option<String>,
    description: String,
    group: Option<String>,
    arguments: Vec<ArgSpec>,
    guards: Guards,
    rate_limit: Option<RateLimitPolicy>,
    middleware: MiddlewareChain,
}

impl CommandDescriptor {
    /// Starts a descriptor for the command `name`.
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name)
    }

    /// Normalized command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized aliases, never containing the name.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn arguments(&self) -> &[ArgSpec] {
        &self.arguments
    }

    /// Number of arguments that must be supplied.
    pub fn required_count(&self) -> usize {
        self.arguments.iter().filter(|a| !a.optional).count()
    }

    pub fn guards(&self) -> &Guards {
        &self.guards
    }

    pub fn rate_limit(&self) -> Option<&RateLimitPolicy> {
        self.rate_limit.as_ref()
    }

    pub fn middleware(&self) -> &MiddlewareChain {
        &self.middleware
    }

    /// The usage template. Without an explicit one it is derived from the
    /// argument declaration, e.g. `<prefix>ban <member> [...reason]`.
    pub fn usage_template(&self) -> String {
        match &self.usage {
            Some(usage) => usage.clone(),
            None => {
                let mut usage = format!("<prefix>{}", self.name);
                for arg in &self.arguments {
                    usage.push(' ');
                    usage.push_str(&arg.usage_fragment());
                }
                usage
            }
        }
    }

    /// The usage line with `<prefix>` replaced.
    pub fn usage_with_prefix(&self, prefix: &str) -> String {
        self.usage_template().replace("<prefix>", prefix)
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`CommandDescriptor`].
///
/// Invalid input (argument syntax, rate-limit strings) is recorded and
/// reported by [`build`](Self::build).
#[derive(Debug)]
pub struct DescriptorBuilder {
    name: String,
    aliases: Vec<String>,
    usage: Option<String>,
    description: String,
    group: Option<String>,
    arguments: Vec<ArgSpec>,
    guards: Guards,
    rate_limit: Option<RateLimitPolicy>,
    middleware: MiddlewareChain,
    error: Option<RegistrationError>,
}

impl DescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            usage: None,
            description: String::new(),
            group: None,
            arguments: Vec::new(),
            guards: Guards::default(),
            rate_limit: None,
            middleware: MiddlewareChain::new(),
            error: None,
        }
    }

    fn fail(&mut self, error: RegistrationError) {
        self.error.get_or_insert(error);
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Usage template; `<prefix>` is substituted when reported.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Appends one declared argument.
    pub fn argument(mut self, spec: ArgSpec) -> Self {
        self.arguments.push(spec);
        self
    }

    /// Appends arguments declared with the bracket syntax.
    pub fn arguments(mut self, signature: &str) -> Self {
        match parse_signature(signature) {
            Ok(specs) => self.arguments.extend(specs),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Rate limit such as `"2/10s"`.
    pub fn ratelimit(mut self, policy: &str) -> Self {
        match policy.parse() {
            Ok(policy) => self.rate_limit = Some(policy),
            Err(e) => self.fail(e),
        }
        self
    }

    pub fn rate_limit(mut self, policy: RateLimitPolicy) -> Self {
        self.rate_limit = Some(policy);
        self
    }

    pub fn owner_only(mut self) -> Self {
        self.guards.owner_only = true;
        self
    }

    pub fn guild_only(mut self) -> Self {
        self.guards.guild_only = true;
        self
    }

    pub fn permission(mut self, permission: Permission) -> Self {
        self.guards.permissions.insert(permission);
        self
    }

    /// Appends a middleware to the chain.
    pub fn using<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Appends the built-in `resolve` middleware.
    pub fn resolve(self) -> Self {
        self.using(middleware::resolve())
    }

    /// Appends the built-in `expect` middleware.
    pub fn expect(self) -> Self {
        self.using(middleware::expect())
    }

    /// Appends the built-in `localize` middleware.
    pub fn localize(self) -> Self {
        self.using(middleware::localize())
    }

    /// Appends a synchronous argument transform.
    pub fn map<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Arguments) -> Result<Arguments, String> + Send + Sync + 'static,
    {
        self.using(middleware::map(name, f))
    }

    /// Validates and finishes the descriptor.
    ///
    /// # Errors
    ///
    /// The first recorded builder error, an empty name, a malformed argument
    /// list or a middleware list in the wrong order.
    pub fn build(self) -> Result<CommandDescriptor, RegistrationError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let name = normalize(&self.name);
        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }

        let mut aliases: Vec<String> = Vec::new();
        for alias in self.aliases.iter().map(|a| normalize(a)) {
            if !alias.is_empty() && alias != name && !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }

        check_signature(&self.arguments)?;
        self.middleware.validate_order(&name)?;

        Ok(CommandDescriptor {
            name,
            aliases,
            usage: self.usage,
            description: self.description,
            group: self.group,
            arguments: self.arguments,
            guards: self.guards,
            rate_limit: self.rate_limit,
            middleware: self.middleware,
        })
    }
}
