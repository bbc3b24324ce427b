//! Foundation layer - data types shared by every part of the pipeline.
//!
//! - Identifier newtypes and the invocation origin ([`Actor`], [`ChannelContext`])
//! - Entities produced by reference lookups
//! - Permission tags checked by static guards
//! - Collaborator error types

pub mod entity;
pub mod error;
pub mod identity;
pub mod permission;

pub use entity::{Channel, ChannelKind, Member, Role, User};
pub use error::{LookupError, LookupResult, ResponderError, SettingsError, SettingsResult};
pub use identity::{Actor, ChannelContext, ChannelId, GuildId, RoleId, UserId};
pub use permission::{Permission, PermissionSet};
