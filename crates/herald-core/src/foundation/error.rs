//! Error types reported by external collaborators.
//!
//! Pipeline-level errors (dispatch, registration, resolution) are defined in
//! `herald-framework`.

use thiserror::Error;

// =============================================================================
// Lookup Errors
// =============================================================================

/// Errors returned by an [`EntityLookup`](crate::EntityLookup) implementation.
///
/// "Not found" is not an error: lookups return `Ok(None)` for that.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// The guild is unknown to the platform client.
    #[error("guild '{0}' is not available")]
    GuildUnavailable(String),

    /// The platform rejected or failed the query.
    #[error("lookup failed: {0}")]
    Backend(String),
}

impl LookupError {
    /// Creates a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

// =============================================================================
// Settings Errors
// =============================================================================

/// Errors returned by a [`SettingStore`](crate::SettingStore).
#[derive(Debug, Clone, Error)]
pub enum SettingsError {
    /// The storage backend failed.
    #[error("settings storage error: {0}")]
    Storage(String),

    /// A stored value did not have the expected shape.
    #[error("setting '{key}' has an unexpected format: {reason}")]
    Malformed {
        /// The setting key.
        key: String,
        /// Why the value could not be used.
        reason: String,
    },
}

impl SettingsError {
    /// Creates a malformed-value error.
    pub fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Responder Errors
// =============================================================================

/// Errors returned when a reply could not be delivered.
#[derive(Debug, Clone, Error)]
pub enum ResponderError {
    /// The channel no longer exists or is not writable.
    #[error("channel '{0}' is not writable")]
    ChannelUnavailable(String),

    /// Delivery failed.
    #[error("failed to send reply: {0}")]
    SendFailed(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for lookup operations.
pub type LookupResult<T> = Result<T, LookupError>;

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
