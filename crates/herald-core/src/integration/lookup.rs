//! Guild, member, role and channel lookups.

use std::sync::Arc;

use async_trait::async_trait;

use crate::foundation::{Channel, GuildId, LookupResult, Member, Role, User};

/// Queries the platform client for entities referenced in command arguments.
///
/// `query` is whatever the user typed after mention syntax has been stripped:
/// a bare id, a name, or a `name#tag`. Implementations decide how loosely to
/// match. A miss is `Ok(None)`; `Err` is reserved for backend failures.
///
/// Calls may hit the network. Callers bound them with a timeout, so
/// implementations do not need their own.
#[async_trait]
pub trait EntityLookup: Send + Sync {
    /// Finds a user known to the client.
    async fn find_user(&self, query: &str) -> LookupResult<Option<User>>;

    /// Finds a member of the given guild.
    async fn find_member(&self, guild: &GuildId, query: &str) -> LookupResult<Option<Member>>;

    /// Finds a role of the given guild.
    async fn find_role(&self, guild: &GuildId, query: &str) -> LookupResult<Option<Role>>;

    /// Finds a channel of the given guild.
    async fn find_channel(&self, guild: &GuildId, query: &str) -> LookupResult<Option<Channel>>;
}

/// Shared handle to an entity lookup.
pub type BoxedLookup = Arc<dyn EntityLookup>;

/// A lookup that never finds anything.
///
/// Useful for bots whose commands take no reference arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLookup;

#[async_trait]
impl EntityLookup for NullLookup {
    async fn find_user(&self, _query: &str) -> LookupResult<Option<User>> {
        Ok(None)
    }

    async fn find_member(&self, _guild: &GuildId, _query: &str) -> LookupResult<Option<Member>> {
        Ok(None)
    }

    async fn find_role(&self, _guild: &GuildId, _query: &str) -> LookupResult<Option<Role>> {
        Ok(None)
    }

    async fn find_channel(&self, _guild: &GuildId, _query: &str) -> LookupResult<Option<Channel>> {
        Ok(None)
    }
}
