//! Per-guild key-value settings.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::foundation::{GuildId, SettingsError, SettingsResult};

/// Which settings table a key lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SettingScope {
    /// Client-wide defaults.
    Global,
    /// Settings of one guild.
    Guild(GuildId),
}

impl fmt::Display for SettingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Guild(id) => write!(f, "guild:{id}"),
        }
    }
}

/// Persisted settings storage.
///
/// Keys read by the dispatcher:
///
/// | key | shape | meaning |
/// |-----|-------|---------|
/// | `prefix` | string | command prefix for the guild |
/// | `lang` | string | language tag for replies |
/// | `limitedCommands` | object of `name -> [role id]` | role-restricted commands |
#[async_trait]
pub trait SettingStore: Send + Sync {
    async fn get(&self, scope: &SettingScope, key: &str) -> SettingsResult<Option<Value>>;

    async fn set(&self, scope: &SettingScope, key: &str, value: Value) -> SettingsResult<()>;

    /// Removes a key. The default implementation stores `null`.
    async fn remove(&self, scope: &SettingScope, key: &str) -> SettingsResult<()> {
        self.set(scope, key, Value::Null).await
    }
}

/// Shared handle to a settings store.
pub type BoxedSettings = Arc<dyn SettingStore>;

/// Reads a setting and deserializes it into `T`.
///
/// A stored `null` is treated the same as an absent key.
pub async fn get_setting<T: DeserializeOwned>(
    store: &dyn SettingStore,
    scope: &SettingScope,
    key: &str,
) -> SettingsResult<Option<T>> {
    match store.get(scope, key).await? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| SettingsError::malformed(key, e.to_string())),
    }
}

/// Process-memory settings, lost on restart.
///
/// Reads of a guild key fall back to the [`SettingScope::Global`] value, so
/// client-wide defaults only need to be set once.
#[derive(Debug, Default)]
pub struct MemorySettings {
    tables: RwLock<HashMap<SettingScope, HashMap<String, Value>>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value synchronously (builder-style bootstrap helper).
    pub fn with(self, scope: SettingScope, key: impl Into<String>, value: Value) -> Self {
        self.tables
            .write()
            .entry(scope)
            .or_default()
            .insert(key.into(), value);
        self
    }

    fn lookup(&self, scope: &SettingScope, key: &str) -> Option<Value> {
        let tables = self.tables.read();
        tables
            .get(scope)
            .and_then(|t| t.get(key))
            .filter(|v| !v.is_null())
            .cloned()
    }
}

#[async_trait]
impl SettingStore for MemorySettings {
    async fn get(&self, scope: &SettingScope, key: &str) -> SettingsResult<Option<Value>> {
        let value = self.lookup(scope, key).or_else(|| match scope {
            SettingScope::Guild(_) => self.lookup(&SettingScope::Global, key),
            SettingScope::Global => None,
        });
        Ok(value)
    }

    async fn set(&self, scope: &SettingScope, key: &str, value: Value) -> SettingsResult<()> {
        self.tables
            .write()
            .entry(scope.clone())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, scope: &SettingScope, key: &str) -> SettingsResult<()> {
        if let Some(table) = self.tables.write().get_mut(scope) {
            table.remove(key);
        }
        Ok(())
    }
}
