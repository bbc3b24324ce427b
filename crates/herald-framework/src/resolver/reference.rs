//! Resolvers for platform entities: users, members, roles and channels.
//!
//! Each accepts a mention (`<@id>`, `<@!id>`, `<@&id>`, `<#id>`), a bare id or
//! a name, and asks the [`EntityLookup`](herald_core::EntityLookup)
//! collaborator. Every lookup is bounded by the configured lookup timeout.

use std::future::Future;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, warn};

use herald_core::{GuildId, LookupResult};

use crate::context::InvocationContext;
use crate::error::ResolveError;
use crate::strings::BaseStrings;
use crate::value::ArgValue;

use super::Resolver;

/// A parsed mention token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mention<'a> {
    User(&'a str),
    Role(&'a str),
    Channel(&'a str),
}

/// Parses a mention token. Returns `None` for anything else.
pub fn parse_mention(raw: &str) -> Option<Mention<'_>> {
    let inner = raw.trim().strip_prefix('<')?.strip_suffix('>')?;
    let mention = if let Some(id) = inner.strip_prefix("@&") {
        Mention::Role(id)
    } else if let Some(id) = inner.strip_prefix("@!") {
        Mention::User(id)
    } else if let Some(id) = inner.strip_prefix('@') {
        Mention::User(id)
    } else if let Some(id) = inner.strip_prefix('#') {
        Mention::Channel(id)
    } else {
        return None;
    };
    let (Mention::User(id) | Mention::Role(id) | Mention::Channel(id)) = mention;
    is_id(id).then_some(mention)
}

fn is_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// The lookup query for `raw`: the id of a mention of the expected kind,
/// otherwise the trimmed text.
fn query<'a>(raw: &'a str, expect: fn(Mention<'a>) -> Option<&'a str>) -> &'a str {
    parse_mention(raw).and_then(expect).unwrap_or_else(|| raw.trim())
}

/// `true` for a mention of the expected kind or a bare id.
fn is_reference_shaped<'a>(raw: &'a str, expect: fn(Mention<'a>) -> Option<&'a str>) -> bool {
    match parse_mention(raw) {
        Some(mention) => expect(mention).is_some(),
        None => is_id(raw.trim()),
    }
}

fn user_id(m: Mention<'_>) -> Option<&str> {
    match m {
        Mention::User(id) => Some(id),
        _ => None,
    }
}

fn role_id(m: Mention<'_>) -> Option<&str> {
    match m {
        Mention::Role(id) => Some(id),
        _ => None,
    }
}

fn channel_id(m: Mention<'_>) -> Option<&str> {
    match m {
        Mention::Channel(id) => Some(id),
        _ => None,
    }
}

/// Runs a lookup under the context's timeout and maps failures to reasons.
async fn bounded<T, F>(ctx: &InvocationContext, lookup: F) -> Result<Option<T>, ResolveError>
where
    F: Future<Output = LookupResult<Option<T>>>,
{
    match timeout(ctx.services().lookup_timeout, lookup).await {
        Ok(Ok(found)) => Ok(found),
        Ok(Err(e)) => {
            warn!(command = %ctx.command().name(), error = %e, "Entity lookup failed");
            Err(ResolveError::failed(
                ctx.resources()
                    .get_with(BaseStrings::LOOKUP_FAILED, &[]),
            ))
        }
        Err(_) => {
            debug!(
                command = %ctx.command().name(),
                timeout = ?ctx.services().lookup_timeout,
                "Entity lookup timed out"
            );
            Err(ResolveError::failed(
                ctx.resources()
                    .get_with(BaseStrings::LOOKUP_TIMED_OUT, &[]),
            ))
        }
    }
}

fn not_found(ctx: &InvocationContext, key: &str, raw: &str) -> ResolveError {
    ResolveError::failed(ctx.resources().get_with(key, &[("value", raw)]))
}

fn require_guild<'c>(ctx: &'c InvocationContext, raw: &str) -> Result<&'c GuildId, ResolveError> {
    ctx.guild_id()
        .ok_or_else(|| not_found(ctx, BaseStrings::GUILD_REQUIRED, raw))
}

// =============================================================================
// Resolvers
// =============================================================================

/// Resolves any platform user.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserResolver;

#[async_trait]
impl Resolver for UserResolver {
    fn validate(&self, value: &ArgValue) -> bool {
        match value {
            ArgValue::User(_) | ArgValue::Member(_) => true,
            ArgValue::Text(raw) => is_reference_shaped(raw, user_id),
            _ => false,
        }
    }

    async fn resolve(
        &self,
        ctx: &InvocationContext,
        _arg: &str,
        raw: &str,
    ) -> Result<ArgValue, ResolveError> {
        let q = query(raw, user_id);
        bounded(ctx, ctx.services().lookup.find_user(q))
            .await?
            .map(ArgValue::User)
            .ok_or_else(|| not_found(ctx, BaseStrings::NO_SUCH_USER, raw))
    }
}

/// Resolves a member of the invocation's guild.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemberResolver;

#[async_trait]
impl Resolver for MemberResolver {
    fn validate(&self, value: &ArgValue) -> bool {
        match value {
            ArgValue::Member(_) => true,
            ArgValue::Text(raw) => is_reference_shaped(raw, user_id),
            _ => false,
        }
    }

    async fn resolve(
        &self,
        ctx: &InvocationContext,
        _arg: &str,
        raw: &str,
    ) -> Result<ArgValue, ResolveError> {
        let guild = require_guild(ctx, raw)?;
        let q = query(raw, user_id);
        bounded(ctx, ctx.services().lookup.find_member(guild, q))
            .await?
            .map(ArgValue::Member)
            .ok_or_else(|| not_found(ctx, BaseStrings::NO_SUCH_MEMBER, raw))
    }
}

/// Resolves a role of the invocation's guild.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleResolver;

#[async_trait]
impl Resolver for RoleResolver {
    fn validate(&self, value: &ArgValue) -> bool {
        match value {
            ArgValue::Role(_) => true,
            ArgValue::Text(raw) => is_reference_shaped(raw, role_id),
            _ => false,
        }
    }

    async fn resolve(
        &self,
        ctx: &InvocationContext,
        _arg: &str,
        raw: &str,
    ) -> Result<ArgValue, ResolveError> {
        let guild = require_guild(ctx, raw)?;
        let q = query(raw, role_id);
        bounded(ctx, ctx.services().lookup.find_role(guild, q))
            .await?
            .map(ArgValue::Role)
            .ok_or_else(|| not_found(ctx, BaseStrings::NO_SUCH_ROLE, raw))
    }
}

/// Resolves a channel of the invocation's guild.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelResolver;

#[async_trait]
impl Resolver for ChannelResolver {
    fn validate(&self, value: &ArgValue) -> bool {
        match value {
            ArgValue::Channel(_) => true,
            ArgValue::Text(raw) => is_reference_shaped(raw, channel_id),
            _ => false,
        }
    }

    async fn resolve(
        &self,
        ctx: &InvocationContext,
        _arg: &str,
        raw: &str,
    ) -> Result<ArgValue, ResolveError> {
        let guild = require_guild(ctx, raw)?;
        let q = query(raw, channel_id);
        bounded(ctx, ctx.services().lookup.find_channel(guild, q))
            .await?
            .map(ArgValue::Channel)
            .ok_or_else(|| not_found(ctx, BaseStrings::NO_SUCH_CHANNEL, raw))
    }
}
