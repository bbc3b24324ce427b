//! Entities produced by reference lookups.

use serde::{Deserialize, Serialize};

use super::identity::{ChannelId, GuildId, RoleId, UserId};

/// A platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Discriminator or handle suffix, if the platform has one.
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tag: None,
            bot: false,
        }
    }

    /// `name#tag` when a tag exists, otherwise the bare name.
    pub fn display_tag(&self) -> String {
        match &self.tag {
            Some(tag) => format!("{}#{}", self.name, tag),
            None => self.name.clone(),
        }
    }
}

/// A user as a member of a specific guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub guild_id: GuildId,
    pub user: User,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

impl Member {
    pub fn new(guild_id: impl Into<GuildId>, user: User) -> Self {
        Self {
            guild_id: guild_id.into(),
            user,
            nickname: None,
            roles: Vec::new(),
        }
    }

    /// The nickname if set, otherwise the user name.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.user.name)
    }
}

/// A guild role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub guild_id: GuildId,
    pub name: String,
}

impl Role {
    pub fn new(
        id: impl Into<RoleId>,
        guild_id: impl Into<GuildId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            guild_id: guild_id.into(),
            name: name.into(),
        }
    }
}

/// The kind of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Text,
    Voice,
    Direct,
}

/// A guild channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub name: String,
    pub kind: ChannelKind,
}

impl Channel {
    /// A text channel inside a guild.
    pub fn text(
        id: impl Into<ChannelId>,
        guild_id: impl Into<GuildId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            guild_id: Some(guild_id.into()),
            name: name.into(),
            kind: ChannelKind::Text,
        }
    }
}
