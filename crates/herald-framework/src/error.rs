//! Error types for the Herald framework.

use std::time::Duration;

use thiserror::Error;
use tower::BoxError;

use herald_core::{Permission, RoleId};

use crate::resolver::format_shorthand;
use crate::strings::{BaseStrings, ResourceLoader};

/// Result returned by a command action.
pub type ActionResult = Result<(), BoxError>;

// =============================================================================
// Registration Errors
// =============================================================================

/// Errors raised while building descriptors or registering commands and
/// resolvers. All of them happen at startup, before any dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A resolver is already bound to the tag.
    #[error("type tag '{0}' is already registered")]
    DuplicateTypeTag(String),

    /// An argument refers to a type no resolver is bound to.
    #[error("command '{command}': argument '{argument}' uses unknown type '{tag}'")]
    UnknownTypeTag {
        command: String,
        argument: String,
        tag: String,
    },

    /// Another command already uses this name.
    #[error("a command named '{0}' is already registered")]
    DuplicateName(String),

    /// A name or alias is already taken by another command.
    #[error("'{alias}' is already used by command '{existing}'")]
    AliasCollision { alias: String, existing: String },

    /// The argument declaration is malformed.
    #[error("invalid argument specification: {0}")]
    InvalidArgumentSpec(String),

    /// The rate-limit string could not be parsed.
    #[error("invalid rate limit '{0}': expected '<count>/<duration>', e.g. '2/10s'")]
    InvalidRateLimit(String),

    /// The middleware list violates the stage ordering rules.
    #[error("command '{command}': {reason}")]
    MiddlewareOrder { command: String, reason: String },

    /// The descriptor has no usable name.
    #[error("command name must not be empty")]
    EmptyName,
}

// =============================================================================
// Resolver Errors
// =============================================================================

/// Errors from the resolver registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No resolver is bound to the tag.
    #[error("unknown type tag '{0}'")]
    UnknownTypeTag(String),

    /// The raw token could not be converted.
    #[error("{reason}")]
    Failed { reason: String },
}

impl ResolveError {
    /// Creates a resolution failure with a human-readable reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Tokenizer Errors
// =============================================================================

/// Errors from the argument tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// Fewer tokens than required arguments.
    #[error("expected at least {expected} argument(s) but got {got}")]
    ArgumentCountMismatch { expected: usize, got: usize },
}

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Why a static guard rejected an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDenial {
    /// The command is restricted to bot owners.
    OwnerOnly,
    /// The command cannot run in direct messages.
    GuildOnly,
    /// The actor lacks these permissions in the channel.
    MissingPermissions(Vec<Permission>),
    /// The guild restricted the command to roles the actor does not hold.
    RoleLimited(Vec<RoleId>),
}

impl std::fmt::Display for GuardDenial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OwnerOnly => f.write_str("owner only"),
            Self::GuildOnly => f.write_str("guild only"),
            Self::MissingPermissions(perms) => {
                let names: Vec<&str> = perms.iter().map(|p| p.as_str()).collect();
                write!(f, "missing permissions: {}", names.join(", "))
            }
            Self::RoleLimited(roles) => {
                let names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
                write!(f, "limited to roles: {}", names.join(", "))
            }
        }
    }
}

/// Terminal failure of one invocation.
///
/// Everything except [`NotACommand`](Self::NotACommand) is rendered into a
/// single message for the actor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// The text did not invoke a registered command. Never reported.
    #[error("not a command")]
    NotACommand,

    #[error("denied: {0}")]
    GuardDenied(GuardDenial),

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("{detail} (usage: {usage})")]
    UsageError { detail: String, usage: String },

    #[error("argument '{argument}': {reason}")]
    ResolutionFailed {
        argument: String,
        reason: String,
        usage: String,
    },

    #[error("argument '{argument}': {reason}")]
    ValidationFailed { argument: String, reason: String },

    /// A custom middleware aborted the chain.
    #[error("middleware '{middleware}' rejected the invocation: {reason}")]
    Rejected { middleware: String, reason: String },

    /// The action returned an error or panicked. The cause is logged, the
    /// actor only sees a generic notice.
    #[error("command action failed: {0}")]
    InternalActionError(String),
}

impl DispatchError {
    /// Creates a custom middleware rejection.
    pub fn rejected(middleware: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            middleware: middleware.into(),
            reason: reason.into(),
        }
    }

    /// Short machine-friendly name of the error kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotACommand => "not_a_command",
            Self::GuardDenied(_) => "guard_denied",
            Self::RateLimited { .. } => "rate_limited",
            Self::UsageError { .. } => "usage_error",
            Self::ResolutionFailed { .. } => "resolution_failed",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::Rejected { .. } => "rejected",
            Self::InternalActionError(_) => "internal_action_error",
        }
    }

    /// Renders the single message reported to the actor, `None` for
    /// [`NotACommand`](Self::NotACommand).
    pub fn render(&self, resources: &ResourceLoader, command: &str) -> Option<String> {
        let text = match self {
            Self::NotACommand => return None,
            Self::GuardDenied(GuardDenial::OwnerOnly) => {
                resources.get_with(BaseStrings::GUARD_OWNER_ONLY, &[])
            }
            Self::GuardDenied(GuardDenial::GuildOnly) => {
                resources.get_with(BaseStrings::GUARD_GUILD_ONLY, &[])
            }
            Self::GuardDenied(GuardDenial::MissingPermissions(perms)) => {
                let names: Vec<&str> = perms.iter().map(|p| p.as_str()).collect();
                resources.get_with(
                    BaseStrings::GUARD_MISSING_PERMISSIONS,
                    &[("permissions", names.join(", ").as_str())],
                )
            }
            Self::GuardDenied(GuardDenial::RoleLimited(_)) => {
                resources.get_with(BaseStrings::GUARD_ROLE_LIMITED, &[])
            }
            Self::RateLimited { retry_after } => {
                // whole seconds, rounded up so "0s" is never shown
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                let retry = format_shorthand(Duration::from_secs(secs.max(1)));
                resources.get_with(
                    BaseStrings::RATE_LIMITED,
                    &[("command", command), ("retry", retry.as_str())],
                )
            }
            Self::UsageError { detail, usage } => resources.get_with(
                BaseStrings::USAGE_ERROR,
                &[("detail", detail.as_str()), ("usage", usage.as_str())],
            ),
            Self::ResolutionFailed {
                argument,
                reason,
                usage,
            } => resources.get_with(
                BaseStrings::RESOLUTION_FAILED,
                &[("argument", argument.as_str()), ("reason", reason.as_str()), ("usage", usage.as_str())],
            ),
            Self::ValidationFailed { argument, reason } => resources.get_with(
                BaseStrings::VALIDATION_FAILED,
                &[("argument", argument.as_str()), ("reason", reason.as_str())],
            ),
            Self::Rejected { middleware, reason } => resources.get_with(
                BaseStrings::REJECTED,
                &[("middleware", middleware.as_str()), ("reason", reason.as_str())],
            ),
            Self::InternalActionError(_) => {
                resources.get_with(BaseStrings::INTERNAL_ERROR, &[("command", command)])
            }
        };
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_a_command_is_silent() {
        assert_eq!(DispatchError::NotACommand.render(&ResourceLoader::english(), "x"), None);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let error = DispatchError::RateLimited {
            retry_after: Duration::from_millis(6_200),
        };
        let text = error.render(&ResourceLoader::english(), "ping").unwrap();
        assert_eq!(text, "You are using `ping` too quickly. Try again in 7s.");
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let error = DispatchError::InternalActionError("db password wrong".into());
        let text = error.render(&ResourceLoader::english(), "ban").unwrap();
        assert!(!text.contains("password"));
        assert!(text.contains("`ban`"));
    }

    #[test]
    fn test_missing_permissions_listed() {
        let error = DispatchError::GuardDenied(GuardDenial::MissingPermissions(vec![
            Permission::KickMembers,
            Permission::BanMembers,
        ]));
        let text = error.render(&ResourceLoader::english(), "ban").unwrap();
        assert!(text.ends_with("KICK_MEMBERS, BAN_MEMBERS"));
    }
}
