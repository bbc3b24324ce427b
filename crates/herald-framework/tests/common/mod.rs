#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use herald_core::{
    Actor, Channel, ChannelContext, EntityLookup, GuildId, LogLevel, LogSink, LookupResult,
    MemorySettings, Member, Permission, PermissionSet, Responder, ResponderError, Role,
    SettingScope, SettingStore, SettingsResult, User,
};
use herald_framework::{Dispatcher, DispatcherBuilder};

/// Captures every reply instead of sending it.
#[derive(Default)]
pub struct RecordingResponder {
    pub sent: Mutex<Vec<(ChannelContext, String)>>,
}

impl RecordingResponder {
    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn last(&self) -> Option<String> {
        self.sent.lock().last().map(|(_, t)| t.clone())
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn send(&self, channel: &ChannelContext, text: &str) -> Result<(), ResponderError> {
        self.sent.lock().push((channel.clone(), text.to_string()));
        Ok(())
    }
}

/// Captures log-sink lines.
#[derive(Default)]
pub struct RecordingLog {
    pub lines: Mutex<Vec<(LogLevel, String, String)>>,
}

impl LogSink for RecordingLog {
    fn emit(&self, level: LogLevel, tag: &str, text: &str) {
        self.lines
            .lock()
            .push((level, tag.to_string(), text.to_string()));
    }
}

/// A settings backend that never answers.
pub struct StalledSettings;

#[async_trait]
impl SettingStore for StalledSettings {
    async fn get(&self, _: &SettingScope, _: &str) -> SettingsResult<Option<Value>> {
        std::future::pending().await
    }

    async fn set(&self, _: &SettingScope, _: &str, _: Value) -> SettingsResult<()> {
        std::future::pending().await
    }
}

/// A responder that never finishes sending.
pub struct StalledResponder;

#[async_trait]
impl Responder for StalledResponder {
    async fn send(&self, _: &ChannelContext, _: &str) -> Result<(), ResponderError> {
        std::future::pending().await
    }
}

/// One guild with alice, a moderator role and a general channel.
pub struct FixtureLookup;

fn alice() -> User {
    User::new("100", "alice")
}

#[async_trait]
impl EntityLookup for FixtureLookup {
    async fn find_user(&self, query: &str) -> LookupResult<Option<User>> {
        Ok(matches!(query, "100" | "alice").then(alice))
    }

    async fn find_member(&self, guild: &GuildId, query: &str) -> LookupResult<Option<Member>> {
        let user = self.find_user(query).await?;
        Ok(user.map(|u| Member::new(guild.clone(), u)))
    }

    async fn find_role(&self, guild: &GuildId, query: &str) -> LookupResult<Option<Role>> {
        Ok(matches!(query, "200" | "my role").then(|| Role::new("200", guild.clone(), "my role")))
    }

    async fn find_channel(&self, guild: &GuildId, query: &str) -> LookupResult<Option<Channel>> {
        Ok(matches!(query, "300" | "general").then(|| Channel::text("300", guild.clone(), "general")))
    }
}

/// Collaborators handed to the dispatcher, kept for assertions.
pub struct Harness {
    pub responder: Arc<RecordingResponder>,
    pub log: Arc<RecordingLog>,
    pub settings: Arc<MemorySettings>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(MemorySettings::new())
    }

    pub fn with_settings(settings: MemorySettings) -> Self {
        Self {
            responder: Arc::new(RecordingResponder::default()),
            log: Arc::new(RecordingLog::default()),
            settings: Arc::new(settings),
        }
    }

    /// A builder wired to the harness collaborators, prefix `!`, owner `owner`.
    pub fn builder(&self) -> DispatcherBuilder {
        Dispatcher::builder()
            .prefix("!")
            .owner("owner")
            .lookup(Arc::new(FixtureLookup))
            .settings(self.settings.clone())
            .responder(self.responder.clone())
            .log_sink(self.log.clone())
    }
}

pub fn member() -> Actor {
    Actor::new("100", "alice")
}

pub fn moderator() -> Actor {
    Actor::new("101", "mod").with_permissions(PermissionSet::from_iter([
        Permission::KickMembers,
        Permission::BanMembers,
    ]))
}

pub fn admin() -> Actor {
    Actor::new("102", "admin")
        .with_permissions(PermissionSet::from_iter([Permission::Administrator]))
}

pub fn guild_channel() -> ChannelContext {
    ChannelContext::guild("g1", "c1")
}
