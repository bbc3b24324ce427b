//! Static guards, checked before rate limiting.
//!
//! Order: owner-only, guild-only, required permissions, per-guild role
//! limits. Owners skip the last two. Required permissions are only checked in
//! guild channels since direct messages carry no permissions. Role limits
//! that cannot be read in time are treated as absent.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::timeout;
use tracing::warn;

use herald_core::{
    Actor, ChannelContext, RoleId, SettingScope, SettingStore, UserId, get_setting,
};

use crate::command::CommandDescriptor;
use crate::error::GuardDenial;

/// Setting key mapping command names to the roles allowed to run them.
pub const LIMITED_COMMANDS_KEY: &str = "limitedCommands";

/// Checks every static guard of `command` for `actor` in `channel`.
pub async fn check_guards(
    command: &CommandDescriptor,
    actor: &Actor,
    channel: &ChannelContext,
    owners: &[UserId],
    settings: &dyn SettingStore,
    wait: Duration,
) -> Result<(), GuardDenial> {
    let guards = command.guards();
    let is_owner = owners.contains(&actor.id);

    if guards.owner_only && !is_owner {
        return Err(GuardDenial::OwnerOnly);
    }

    let Some(guild) = channel.guild_id.as_ref() else {
        return if guards.guild_only {
            Err(GuardDenial::GuildOnly)
        } else {
            Ok(())
        };
    };

    if is_owner {
        return Ok(());
    }

    let missing = actor.permissions.missing(&guards.permissions);
    if !missing.is_empty() {
        return Err(GuardDenial::MissingPermissions(missing));
    }

    let scope = SettingScope::Guild(guild.clone());
    let read = get_setting(settings, &scope, LIMITED_COMMANDS_KEY);
    let limits: HashMap<String, Vec<RoleId>> = match timeout(wait, read).await {
        Ok(Ok(limits)) => limits.unwrap_or_default(),
        Ok(Err(e)) => {
            warn!(guild = %guild, error = %e, "Ignoring unreadable role limits");
            HashMap::new()
        }
        Err(_) => {
            warn!(guild = %guild, timeout = ?wait, "Role limits read timed out, ignoring them");
            HashMap::new()
        }
    };

    match limits.get(command.name()) {
        Some(roles) if !roles.is_empty() && !roles.iter().any(|r| actor.has_role(r)) => {
            Err(GuardDenial::RoleLimited(roles.clone()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{Value, json};

    use herald_core::{MemorySettings, Permission, PermissionSet, SettingsResult};

    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    fn ban() -> CommandDescriptor {
        CommandDescriptor::builder("ban")
            .guild_only()
            .permission(Permission::BanMembers)
            .build()
            .unwrap()
    }

    fn moderator() -> Actor {
        Actor::new("mod", "mod")
            .with_permissions(PermissionSet::from_iter([Permission::BanMembers]))
    }

    async fn check(
        command: &CommandDescriptor,
        actor: &Actor,
        channel: &ChannelContext,
        owners: &[UserId],
        settings: &dyn SettingStore,
    ) -> Result<(), GuardDenial> {
        check_guards(command, actor, channel, owners, settings, WAIT).await
    }

    /// Never answers.
    struct StalledSettings;

    #[async_trait]
    impl SettingStore for StalledSettings {
        async fn get(&self, _: &SettingScope, _: &str) -> SettingsResult<Option<Value>> {
            std::future::pending().await
        }

        async fn set(&self, _: &SettingScope, _: &str, _: Value) -> SettingsResult<()> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_owner_only() {
        let command = CommandDescriptor::builder("eval").owner_only().build().unwrap();
        let settings = MemorySettings::new();
        let channel = ChannelContext::direct("dm");
        let owners = [UserId::new("owner")];

        let denied = check(&command, &Actor::new("u1", "x"), &channel, &owners, &settings).await;
        assert_eq!(denied, Err(GuardDenial::OwnerOnly));
        let owner = Actor::new("owner", "o");
        let allowed = check(&command, &owner, &channel, &owners, &settings).await;
        assert_eq!(allowed, Ok(()));
    }

    #[tokio::test]
    async fn test_guild_only() {
        let settings = MemorySettings::new();
        let channel = ChannelContext::direct("dm");
        let result = check(&ban(), &moderator(), &channel, &[], &settings).await;
        assert_eq!(result, Err(GuardDenial::GuildOnly));
    }

    #[tokio::test]
    async fn test_missing_permissions_and_owner_bypass() {
        let settings = MemorySettings::new();
        let channel = ChannelContext::guild("g1", "c1");
        let result = check(&ban(), &Actor::new("u1", "x"), &channel, &[], &settings).await;
        assert_eq!(
            result,
            Err(GuardDenial::MissingPermissions(vec![Permission::BanMembers]))
        );

        let owners = [UserId::new("u1")];
        let result = check(&ban(), &Actor::new("u1", "x"), &channel, &owners, &settings).await;
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn test_role_limits() {
        let settings = MemorySettings::new().with(
            SettingScope::Guild("g1".into()),
            LIMITED_COMMANDS_KEY,
            json!({ "ban": ["r-mod"] }),
        );
        let channel = ChannelContext::guild("g1", "c1");

        let result = check(&ban(), &moderator(), &channel, &[], &settings).await;
        assert_eq!(result, Err(GuardDenial::RoleLimited(vec![RoleId::new("r-mod")])));

        let with_role = moderator().with_roles(["r-mod"]);
        assert_eq!(check(&ban(), &with_role, &channel, &[], &settings).await, Ok(()));

        // other guilds are unaffected
        let elsewhere = ChannelContext::guild("g2", "c1");
        assert_eq!(check(&ban(), &moderator(), &elsewhere, &[], &settings).await, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_role_limits_are_ignored() {
        let channel = ChannelContext::guild("g1", "c1");
        let wait = Duration::from_millis(50);
        let started = tokio::time::Instant::now();

        let result =
            check_guards(&ban(), &moderator(), &channel, &[], &StalledSettings, wait).await;

        assert_eq!(result, Ok(()));
        assert!(started.elapsed() >= wait);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
