//! Console Bot Example
//!
//! Every line typed on stdin is handled as a chat message from one user, and
//! replies are printed back. Useful for trying out commands, guards and rate
//! limits without a chat platform.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --owner --perm BAN_MEMBERS
//! > !add 2 40
//! > !ban grace "spamming links"
//! > !remind 5s stretch your legs
//! ```

mod commands;
mod console;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use herald::core::{Actor, ChannelContext, MemorySettings, Permission, PermissionSet};
use herald::framework::Incoming;
use herald::runtime::{HeraldConfig, HeraldRuntime};

use crate::commands::Phrasebook;
use crate::console::{ConsoleResponder, Directory};

#[derive(Debug, Parser)]
#[command(name = "console-bot", about = "Drive the Herald dispatcher from a terminal")]
struct Cli {
    /// Configuration file (herald.toml is searched for otherwise).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile.
    #[arg(long)]
    profile: Option<String>,

    /// ID of the user sending the messages.
    #[arg(long, default_value = "1001")]
    user: String,

    /// Display name of that user.
    #[arg(long, default_value = "ada")]
    name: String,

    /// Make the user a bot owner.
    #[arg(long)]
    owner: bool,

    /// Permission held by the user, e.g. `BAN_MEMBERS`. Repeatable.
    #[arg(long = "perm")]
    permissions: Vec<Permission>,

    /// Role ID held by the user. Repeatable.
    #[arg(long = "role")]
    roles: Vec<String>,

    #[arg(long, default_value = "guild-1")]
    guild: String,

    #[arg(long, default_value = "3001")]
    channel: String,

    /// Send as direct messages instead of in the guild channel.
    #[arg(long)]
    dm: bool,
}

impl Cli {
    fn actor(&self) -> Actor {
        Actor::new(self.user.as_str(), self.name.as_str())
            .with_roles(self.roles.iter().map(String::as_str))
            .with_permissions(self.permissions.iter().copied().collect::<PermissionSet>())
    }

    fn channel(&self) -> ChannelContext {
        if self.dm {
            ChannelContext::direct(self.channel.as_str())
        } else {
            ChannelContext::guild(self.guild.as_str(), self.channel.as_str())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut overrides = HeraldConfig::default();
    if cli.owner {
        overrides.dispatcher.owners.push(cli.user.clone());
    }

    let mut builder = HeraldRuntime::builder()
        .merge(overrides)
        .lookup(Arc::new(Directory::sample()))
        .settings(Arc::new(MemorySettings::new()))
        .localizer(Arc::new(Phrasebook))
        .responder(Arc::new(ConsoleResponder));
    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &cli.profile {
        builder = builder.profile(profile.as_str());
    }

    let mut runtime = builder.build()?;
    commands::register_all(&mut runtime)?;

    info!(
        user = %cli.user,
        prefix = %runtime.config().dispatcher.prefix,
        commands = runtime.dispatcher().commands().len(),
        "Console bot ready, type messages below"
    );

    let (actor, channel) = (cli.actor(), cli.channel());
    let lines = BufReader::new(tokio::io::stdin()).lines();
    let messages = stream::unfold(lines, move |mut lines| {
        let (actor, channel) = (actor.clone(), channel.clone());
        async move {
            match lines.next_line().await {
                Ok(Some(line)) => Some((Incoming::new(line, actor, channel), lines)),
                Ok(None) => None,
                Err(e) => {
                    error!(error = %e, "Failed to read stdin");
                    None
                }
            }
        }
    });

    let stats = runtime.run(messages).await;
    info!(
        received = stats.received,
        completed = stats.completed,
        failed = stats.failed,
        ignored = stats.ignored,
        "Bye"
    );

    Ok(())
}
