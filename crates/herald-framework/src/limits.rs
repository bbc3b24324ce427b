//! Management commands for per-guild role limits.
//!
//! ```text
//! limit <command> <role, role...>   add roles to the command's entry
//! clearlimit <command>              drop the command's entry
//! ```
//!
//! Both edit the `limitedCommands` guild setting read by the role-limit guard
//! and require Administrator. Roles are separated by commas so names may
//! contain spaces.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::timeout;
use tracing::info;

use herald_core::{Permission, RoleId, SettingScope, get_setting};

use crate::BoxError;
use crate::command::CommandDescriptor;
use crate::context::InvocationContext;
use crate::dispatcher::Dispatcher;
use crate::error::RegistrationError;
use crate::guard::LIMITED_COMMANDS_KEY;
use crate::strings::BaseStrings;
use crate::value::Arguments;

type RoleLimits = HashMap<String, Vec<RoleId>>;

impl Dispatcher {
    /// Registers `limit` and `clearlimit`.
    pub fn register_limit_commands(&mut self) -> Result<(), RegistrationError> {
        self.register(
            CommandDescriptor::builder("limit")
                .describe("Restricts a command to the given roles")
                .group("groupcontrol")
                .arguments("<command>: String, <...roles>: String")
                .guild_only()
                .permission(Permission::Administrator)
                .build()?,
            limit,
        )?;
        self.register(
            CommandDescriptor::builder("clearlimit")
                .describe("Removes role restrictions from a command")
                .group("groupcontrol")
                .arguments("<command>: String")
                .guild_only()
                .permission(Permission::Administrator)
                .build()?,
            clear_limit,
        )
    }
}

async fn limit(
    ctx: Arc<InvocationContext>,
    args: Arguments,
) -> Result<Option<String>, BoxError> {
    let Some(guild) = ctx.guild_id().cloned() else {
        return Ok(None);
    };
    let res = ctx.resources();
    let name = match target_name(&ctx, args[0].as_text().unwrap_or_default()) {
        Ok(name) => name,
        Err(reply) => return Ok(Some(reply)),
    };

    let queries = args[1].as_text().unwrap_or_default();
    let mut roles = Vec::new();
    for query in queries.split(',').map(str::trim).filter(|q| !q.is_empty()) {
        let value = match ctx.services().resolvers.resolve("Role", &ctx, "roles", query).await {
            Ok(value) => value,
            Err(e) => return Ok(Some(e.to_string())),
        };
        if let Some(role) = value.as_role() {
            roles.push(role.clone());
        }
    }
    if roles.is_empty() {
        return Ok(Some(res.get_with(BaseStrings::LIMIT_NO_ROLES, &[])));
    }

    let scope = SettingScope::Guild(guild.clone());
    let mut limits = read_limits(&ctx, &scope).await?;
    let allowed = limits.entry(name.clone()).or_default();
    for role in &roles {
        if !allowed.contains(&role.id) {
            allowed.push(role.id.clone());
        }
    }
    write_limits(&ctx, &scope, &limits).await?;

    let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
    info!(command = %name, guild = %guild, roles = ?names, "Limited command to roles");
    Ok(Some(res.get_with(
        BaseStrings::LIMIT_SET,
        &[("command", name.as_str()), ("roles", names.join(", ").as_str())],
    )))
}

async fn clear_limit(
    ctx: Arc<InvocationContext>,
    args: Arguments,
) -> Result<Option<String>, BoxError> {
    let Some(guild) = ctx.guild_id().cloned() else {
        return Ok(None);
    };
    let name = match target_name(&ctx, args[0].as_text().unwrap_or_default()) {
        Ok(name) => name,
        Err(reply) => return Ok(Some(reply)),
    };

    let scope = SettingScope::Guild(guild.clone());
    let mut limits = read_limits(&ctx, &scope).await?;
    if limits.remove(&name).is_some() {
        write_limits(&ctx, &scope, &limits).await?;
        info!(command = %name, guild = %guild, "Cleared role limits");
    }

    Ok(Some(
        ctx.resources()
            .get_with(BaseStrings::LIMIT_CLEARED, &[("command", name.as_str())]),
    ))
}

/// Name of the command `word` refers to, or the reply for an unknown word.
fn target_name(ctx: &InvocationContext, word: &str) -> Result<String, String> {
    match ctx.commands().find(word) {
        Some(command) => Ok(command.descriptor.name().to_string()),
        None => Err(ctx
            .resources()
            .get_with(BaseStrings::LIMIT_UNKNOWN_COMMAND, &[("command", word)])),
    }
}

async fn read_limits(
    ctx: &InvocationContext,
    scope: &SettingScope,
) -> Result<RoleLimits, BoxError> {
    let services = ctx.services();
    let read = get_setting::<RoleLimits>(services.settings.as_ref(), scope, LIMITED_COMMANDS_KEY);
    let limits = timeout(services.lookup_timeout, read).await??;
    Ok(limits.unwrap_or_default())
}

async fn write_limits(
    ctx: &InvocationContext,
    scope: &SettingScope,
    limits: &RoleLimits,
) -> Result<(), BoxError> {
    let services = ctx.services();
    let value = serde_json::to_value(limits)?;
    let write = services.settings.set(scope, LIMITED_COMMANDS_KEY, value);
    timeout(services.lookup_timeout, write).await??;
    Ok(())
}
