//! Demo commands.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use herald::core::{Localizer, Permission, SettingScope, Substitutions, interpolate};
use herald::framework::strings::BaseStrings;
use herald::prelude::*;
use herald::runtime::RuntimeResult;

/// German strings for the `ban` command and the rate-limit notice.
pub struct Phrasebook;

impl Localizer for Phrasebook {
    fn resolve_string(&self, lang: &str, key: &str, subs: &Substitutions) -> Option<String> {
        let template = match (lang, key) {
            ("de", "ban.done") => "{{ member }} wurde gebannt: {{ reason }}",
            ("de", "ban.no_reason") => "kein Grund angegeben",
            ("de", BaseStrings::RATE_LIMITED) => {
                "Nicht so schnell! `{{ command }}` geht wieder in {{ retry }}."
            }
            ("en", "ban.done") => "{{ member }} was banned: {{ reason }}",
            ("en", "ban.no_reason") => "no reason given",
            _ => return None,
        };
        Some(interpolate(template, subs))
    }
}

pub fn register_all(runtime: &mut HeraldRuntime) -> RuntimeResult<()> {
    runtime.register_limit_commands()?;

    runtime.register(
        CommandDescriptor::builder("ping")
            .describe("Checks that the bot is alive")
            .build()?,
        |_ctx: Arc<InvocationContext>, _args: Arguments| async { "pong" },
    )?;

    runtime.register(
        CommandDescriptor::builder("add")
            .alias("sum")
            .describe("Adds two numbers")
            .arguments("<a>: Number, <b>: Number")
            .ratelimit("5/10s")
            .resolve()
            .build()?,
        add,
    )?;

    runtime.register(
        CommandDescriptor::builder("remind")
            .describe("Replies after a delay, e.g. `remind 10s stretch`")
            .arguments("<in>: Duration, <...text>: String")
            .resolve()
            .build()?,
        remind,
    )?;

    runtime.register(
        CommandDescriptor::builder("ban")
            .describe("Bans a member")
            .arguments("<member>: Member, [...reason]: String")
            .guild_only()
            .permission(Permission::BanMembers)
            .ratelimit("2/30s")
            .resolve()
            .expect()
            .localize()
            .build()?,
        ban,
    )?;

    runtime.register(
        CommandDescriptor::builder("lang")
            .describe("Sets this server's language")
            .arguments("<lang>: ['en', 'de']")
            .guild_only()
            .permission(Permission::ManageGuild)
            .resolve()
            .build()?,
        set_setting("lang"),
    )?;

    runtime.register(
        CommandDescriptor::builder("setprefix")
            .describe("Sets this server's command prefix")
            .arguments("<prefix>: String")
            .owner_only()
            .guild_only()
            .map("short-prefix", short_prefix)
            .build()?,
        set_setting("prefix"),
    )?;

    runtime.register(
        CommandDescriptor::builder("explode")
            .describe("Fails on purpose")
            .build()?,
        |_ctx: Arc<InvocationContext>, _args: Arguments| async {
            Err::<(), BoxError>("the reactor is on fire".into())
        },
    )?;

    Ok(())
}

async fn add(_ctx: Arc<InvocationContext>, args: Arguments) -> String {
    let a = args[0].as_number().unwrap_or_default();
    let b = args[1].as_number().unwrap_or_default();
    format!("{a} + {b} = {}", a + b)
}

async fn remind(ctx: Arc<InvocationContext>, args: Arguments) -> &'static str {
    let delay = args[0].as_duration().unwrap_or(Duration::ZERO);
    let text = args[1].to_string();
    let who = ctx.actor().name.clone();

    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = ctx.reply(&format!("{who}, reminder: {text}")).await;
    });
    "ok, I'll remind you"
}

async fn ban(_ctx: Arc<InvocationContext>, args: Arguments) -> String {
    let Some(strings) = args.resources() else {
        return String::new();
    };
    let member = args[1]
        .as_member()
        .map(|m| m.display_name().to_string())
        .unwrap_or_default();
    let reason = match args[2].as_text() {
        Some(reason) => reason.to_string(),
        None => strings.get_with("ban.no_reason", &[]),
    };
    strings.get_with(
        "ban.done",
        &[("member", member.as_str()), ("reason", reason.as_str())],
    )
}

/// Accepts prefixes of at most three characters.
fn short_prefix(args: Arguments) -> Result<Arguments, String> {
    if args[0].as_text().is_some_and(|p| p.chars().count() <= 3) {
        Ok(args)
    } else {
        Err("a prefix is at most three characters".to_string())
    }
}

/// Stores the first argument as a guild setting.
fn set_setting(
    key: &'static str,
) -> impl Fn(Arc<InvocationContext>, Arguments) -> BoxFuture<'static, Result<String, BoxError>>
+ Send
+ Sync
+ 'static {
    move |ctx: Arc<InvocationContext>, args: Arguments| -> BoxFuture<'static, Result<String, BoxError>> {
        Box::pin(async move {
            let Some(guild) = ctx.guild_id().cloned() else {
                return Ok::<_, BoxError>(String::new());
            };
            let value = args[0].as_text().unwrap_or_default().to_string();
            ctx.services()
                .settings
                .set(&SettingScope::Guild(guild), key, serde_json::json!(value))
                .await?;
            Ok(format!("`{key}` is now `{value}`"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(p: &str) -> Arguments {
        Arguments::from(vec![ArgValue::from(p)])
    }

    #[test]
    fn test_short_prefix_counts_characters() {
        assert!(short_prefix(prefix("?!")).is_ok());
        assert!(short_prefix(prefix("»»")).is_ok());
        assert!(short_prefix(prefix("ééé")).is_ok());
        assert!(short_prefix(prefix("!!!!")).is_err());
    }
}
