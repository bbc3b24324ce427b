//! # Herald Core
//!
//! Shared building blocks for the Herald command pipeline.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! Plain data passed through every invocation:
//! - **Identities**: [`UserId`], [`GuildId`], [`ChannelId`], [`RoleId`]
//! - **Invocation origin**: [`Actor`] and [`ChannelContext`]
//! - **Entities**: [`User`], [`Member`], [`Role`], [`Channel`] returned by lookups
//! - **Permissions**: [`Permission`] and [`PermissionSet`]
//!
//! ### Integration Layer
//!
//! Narrow interfaces to the collaborators the pipeline consumes but does not
//! own:
//! - **Entity lookup**: guild member/role/channel queries ([`EntityLookup`])
//! - **Settings**: per-guild key-value configuration ([`SettingStore`])
//! - **Localization**: string-table rendering ([`Localizer`])
//! - **Logging**: fire-and-forget operator log lines ([`LogSink`])
//! - **Replies**: sending text back to the originating channel ([`Responder`])
//!
//! ```text
//! ┌───────────┐   handle_incoming   ┌────────────┐   find / get / send   ┌───────────────┐
//! │ Transport │───────────────────▶│ Dispatcher │──────────────────────▶│ Collaborators │
//! └───────────┘                     └────────────┘                       └───────────────┘
//! ```

pub mod foundation;
pub mod integration;

pub use foundation::{
    Actor, Channel, ChannelContext, ChannelId, ChannelKind, GuildId, LookupError, LookupResult,
    Member, Permission, PermissionSet, ResponderError, Role, RoleId, SettingsError,
    SettingsResult, User, UserId,
};

pub use integration::{
    BoxedLocalizer, BoxedLogSink, BoxedLookup, BoxedResponder, BoxedSettings, EntityLookup,
    LogLevel, LogSink, Localizer, MemorySettings, NullLookup, NullResponder, Responder,
    SettingScope, SettingStore, Substitutions, TracingLogSink, get_setting, interpolate,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::*;
    pub use super::integration::*;
}
