//! Identifiers and the origin of an invocation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::entity::ChannelKind;
use super::permission::PermissionSet;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Platform identifier of a user.
    UserId
);
define_id!(
    /// Platform identifier of a guild (server / group).
    GuildId
);
define_id!(
    /// Platform identifier of a channel.
    ChannelId
);
define_id!(
    /// Platform identifier of a role.
    RoleId
);

/// The user who sent the message being dispatched.
///
/// The transport fills in `roles` and `permissions` as they apply in the
/// originating channel; direct messages carry none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The user's platform id.
    pub id: UserId,
    /// Display name, used only in log lines.
    pub name: String,
    /// Roles the user holds in the originating guild.
    pub roles: Vec<RoleId>,
    /// Effective permissions in the originating channel.
    pub permissions: PermissionSet,
}

impl Actor {
    /// Creates an actor with no roles and no permissions.
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            roles: Vec::new(),
            permissions: PermissionSet::empty(),
        }
    }

    /// Sets the actor's roles (builder pattern).
    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleId>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the actor's effective permissions (builder pattern).
    pub fn with_permissions(mut self, permissions: PermissionSet) -> Self {
        self.permissions = permissions;
        self
    }

    /// Returns `true` if the actor holds the given role.
    pub fn has_role(&self, role: &RoleId) -> bool {
        self.roles.contains(role)
    }
}

/// Where a message was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelContext {
    /// The channel the message arrived in.
    pub channel_id: ChannelId,
    /// The guild owning the channel; `None` for direct messages.
    pub guild_id: Option<GuildId>,
    /// The kind of channel.
    pub kind: ChannelKind,
}

impl ChannelContext {
    /// A text channel inside a guild.
    pub fn guild(guild_id: impl Into<GuildId>, channel_id: impl Into<ChannelId>) -> Self {
        Self {
            channel_id: channel_id.into(),
            guild_id: Some(guild_id.into()),
            kind: ChannelKind::Text,
        }
    }

    /// A direct-message channel.
    pub fn direct(channel_id: impl Into<ChannelId>) -> Self {
        Self {
            channel_id: channel_id.into(),
            guild_id: None,
            kind: ChannelKind::Direct,
        }
    }

    /// Returns `true` if the message did not come from a guild.
    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Permission;

    #[test]
    fn test_id_display_and_eq() {
        let a = UserId::new("42");
        let b: UserId = "42".into();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "42");
    }

    #[test]
    fn test_actor_builder() {
        let actor = Actor::new("1", "alice")
            .with_roles(["mod"])
            .with_permissions(PermissionSet::from_iter([Permission::ManageRoles]));
        assert!(actor.has_role(&RoleId::new("mod")));
        assert!(actor.permissions.contains(Permission::ManageRoles));
    }

    #[test]
    fn test_channel_context_kinds() {
        assert!(ChannelContext::direct("c").is_direct());
        let guild = ChannelContext::guild("g", "c");
        assert!(!guild.is_direct());
        assert_eq!(guild.kind, ChannelKind::Text);
    }
}
