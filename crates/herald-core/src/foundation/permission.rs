//! Permission tags checked by the static guard stage.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A channel- or guild-level permission.
///
/// Serialized in `SCREAMING_SNAKE_CASE` (`"MANAGE_ROLES"`), which is also the
/// form accepted by [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Implies every other permission.
    Administrator,
    ManageGuild,
    ManageRoles,
    ManageChannels,
    ManageMessages,
    KickMembers,
    BanMembers,
    SendMessages,
    EmbedLinks,
    AttachFiles,
    MentionEveryone,
}

impl Permission {
    /// All known permissions, in declaration order.
    pub const ALL: [Permission; 11] = [
        Permission::Administrator,
        Permission::ManageGuild,
        Permission::ManageRoles,
        Permission::ManageChannels,
        Permission::ManageMessages,
        Permission::KickMembers,
        Permission::BanMembers,
        Permission::SendMessages,
        Permission::EmbedLinks,
        Permission::AttachFiles,
        Permission::MentionEveryone,
    ];

    /// Returns the canonical tag (`"MANAGE_ROLES"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrator => "ADMINISTRATOR",
            Self::ManageGuild => "MANAGE_GUILD",
            Self::ManageRoles => "MANAGE_ROLES",
            Self::ManageChannels => "MANAGE_CHANNELS",
            Self::ManageMessages => "MANAGE_MESSAGES",
            Self::KickMembers => "KICK_MEMBERS",
            Self::BanMembers => "BAN_MEMBERS",
            Self::SendMessages => "SEND_MESSAGES",
            Self::EmbedLinks => "EMBED_LINKS",
            Self::AttachFiles => "ATTACH_FILES",
            Self::MentionEveryone => "MENTION_EVERYONE",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| format!("unknown permission: {s}"))
    }
}

/// An ordered set of permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// The empty set.
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn insert(&mut self, permission: Permission) {
        self.0.insert(permission);
    }

    /// Returns `true` if the permission is held directly or through
    /// [`Permission::Administrator`].
    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&Permission::Administrator) || self.0.contains(&permission)
    }

    /// Returns the permissions of `required` that this set does not grant.
    pub fn missing(&self, required: &PermissionSet) -> Vec<Permission> {
        required
            .iter()
            .filter(|p| !self.contains(*p))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
