//! Type resolvers.
//!
//! A resolver turns one raw argument token into a typed [`ArgValue`]. Each is
//! bound to a case-sensitive type tag (`"Number"`, `"Member"`, ...) in a
//! [`ResolverRegistry`] that is filled once at startup and never changes
//! afterwards.
//!
//! Resolvers also expose a cheap synchronous [`Resolver::validate`] check
//! used by the `expect` middleware: typed values of the right variant pass,
//! and raw text passes when it is syntactically acceptable. That keeps
//! "malformed" (validation) apart from "not found" (resolution).

mod builtin;
mod duration;
mod reference;

pub use builtin::{BooleanResolver, ChoiceResolver, NumberResolver, StringResolver};
pub use duration::{DurationResolver, format_shorthand, parse_shorthand};
pub use reference::{
    ChannelResolver, MemberResolver, Mention, RoleResolver, UserResolver, parse_mention,
};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::command::ArgKind;
use crate::context::InvocationContext;
use crate::error::{RegistrationError, ResolveError};
use crate::value::ArgValue;

/// Converts raw argument text into a typed value.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Cheap syntactic check; never touches collaborators.
    fn validate(&self, value: &ArgValue) -> bool;

    /// Resolves `raw` for the argument named `arg`.
    async fn resolve(
        &self,
        ctx: &InvocationContext,
        arg: &str,
        raw: &str,
    ) -> Result<ArgValue, ResolveError>;
}

/// Shared handle to a resolver.
pub type BoxedResolver = Arc<dyn Resolver>;

/// Type tag to resolver map.
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    resolvers: HashMap<String, BoxedResolver>,
}

impl ResolverRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in resolver bound to its default tag:
    /// `String`, `Number`, `Boolean`, `Duration`, `User`, `Member`, `Role`
    /// and `Channel`.
    pub fn with_builtins() -> Self {
        let mut resolvers: HashMap<String, BoxedResolver> = HashMap::new();
        resolvers.insert("String".into(), Arc::new(StringResolver));
        resolvers.insert("Number".into(), Arc::new(NumberResolver::new()));
        resolvers.insert("Boolean".into(), Arc::new(BooleanResolver));
        resolvers.insert("Duration".into(), Arc::new(DurationResolver));
        resolvers.insert("User".into(), Arc::new(UserResolver));
        resolvers.insert("Member".into(), Arc::new(MemberResolver));
        resolvers.insert("Role".into(), Arc::new(RoleResolver));
        resolvers.insert("Channel".into(), Arc::new(ChannelResolver));
        Self { resolvers }
    }

    /// Binds `resolver` to `tag`.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::DuplicateTypeTag`] if the tag is already bound.
    pub fn register<R>(&mut self, tag: impl Into<String>, resolver: R) -> Result<(), RegistrationError>
    where
        R: Resolver + 'static,
    {
        let tag = tag.into();
        if self.resolvers.contains_key(&tag) {
            return Err(RegistrationError::DuplicateTypeTag(tag));
        }
        self.resolvers.insert(tag, Arc::new(resolver));
        Ok(())
    }

    /// Returns the resolver bound to `tag`.
    pub fn get(&self, tag: &str) -> Result<BoxedResolver, ResolveError> {
        self.resolvers
            .get(tag)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownTypeTag(tag.to_string()))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.resolvers.contains_key(tag)
    }

    /// All bound tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Resolves `raw` with the resolver bound to `tag`.
    pub async fn resolve(
        &self,
        tag: &str,
        ctx: &InvocationContext,
        arg: &str,
        raw: &str,
    ) -> Result<ArgValue, ResolveError> {
        let resolver = self.get(tag)?;
        trace!(tag, arg, raw, "Resolving argument");
        resolver.resolve(ctx, arg, raw).await
    }

    /// Resolves `raw` for an argument of the given kind; inline choice sets
    /// are resolved without a registry entry.
    pub async fn resolve_kind(
        &self,
        kind: &ArgKind,
        ctx: &InvocationContext,
        arg: &str,
        raw: &str,
    ) -> Result<ArgValue, ResolveError> {
        match kind {
            ArgKind::Type(tag) => self.resolve(tag, ctx, arg, raw).await,
            ArgKind::Choice(choices) => {
                ChoiceResolver::new(choices.iter().cloned())
                    .resolve(ctx, arg, raw)
                    .await
            }
        }
    }

    /// Runs the cheap validation check for an argument of the given kind.
    pub fn validate_kind(&self, kind: &ArgKind, value: &ArgValue) -> Result<bool, ResolveError> {
        match kind {
            ArgKind::Type(tag) => Ok(self.get(tag)?.validate(value)),
            ArgKind::Choice(choices) => {
                Ok(ChoiceResolver::new(choices.iter().cloned()).validate(value))
            }
        }
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
