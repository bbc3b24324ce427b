//! User-facing strings.
//!
//! Every message the pipeline produces goes through a [`ResourceLoader`]. The
//! loader asks the configured [`Localizer`](herald_core::Localizer) first and
//! falls back to the built-in English table in [`BaseStrings`], so a bot works
//! without any string files.

use std::fmt;

use herald_core::{BoxedLocalizer, Substitutions, interpolate};

/// Keys and English text of the built-in strings.
pub struct BaseStrings;

impl BaseStrings {
    pub const GUARD_OWNER_ONLY: &'static str = "dispatch.guard.owner_only";
    pub const GUARD_GUILD_ONLY: &'static str = "dispatch.guard.guild_only";
    pub const GUARD_MISSING_PERMISSIONS: &'static str = "dispatch.guard.missing_permissions";
    pub const GUARD_ROLE_LIMITED: &'static str = "dispatch.guard.role_limited";
    pub const RATE_LIMITED: &'static str = "dispatch.rate_limited";
    pub const USAGE_ERROR: &'static str = "dispatch.usage_error";
    pub const RESOLUTION_FAILED: &'static str = "dispatch.resolution_failed";
    pub const VALIDATION_FAILED: &'static str = "dispatch.validation_failed";
    pub const REJECTED: &'static str = "dispatch.rejected";
    pub const INTERNAL_ERROR: &'static str = "dispatch.internal_error";
    pub const ARGUMENT_COUNT: &'static str = "tokenize.argument_count";

    pub const INVALID_VALUE: &'static str = "validate.invalid_value";
    pub const NOT_A_NUMBER: &'static str = "resolver.number.invalid";
    pub const OUT_OF_RANGE: &'static str = "resolver.number.out_of_range";
    pub const NOT_A_BOOLEAN: &'static str = "resolver.boolean.invalid";
    pub const INVALID_DURATION: &'static str = "resolver.duration.invalid";
    pub const INVALID_CHOICE: &'static str = "resolver.choice.invalid";
    pub const NO_SUCH_USER: &'static str = "resolver.user.not_found";
    pub const NO_SUCH_MEMBER: &'static str = "resolver.member.not_found";
    pub const NO_SUCH_ROLE: &'static str = "resolver.role.not_found";
    pub const NO_SUCH_CHANNEL: &'static str = "resolver.channel.not_found";
    pub const GUILD_REQUIRED: &'static str = "resolver.guild_required";
    pub const LOOKUP_TIMED_OUT: &'static str = "resolver.lookup_timed_out";
    pub const LOOKUP_FAILED: &'static str = "resolver.lookup_failed";

    pub const LIMIT_UNKNOWN_COMMAND: &'static str = "limit.unknown_command";
    pub const LIMIT_NO_ROLES: &'static str = "limit.no_roles";
    pub const LIMIT_SET: &'static str = "limit.set";
    pub const LIMIT_CLEARED: &'static str = "limit.cleared";

    /// English text for a key.
    pub fn english(key: &str) -> Option<&'static str> {
        let text = match key {
            Self::GUARD_OWNER_ONLY => "This command can only be used by the bot owners.",
            Self::GUARD_GUILD_ONLY => "This command can only be used in a server.",
            Self::GUARD_MISSING_PERMISSIONS => {
                "You need the following permissions to use this command: {{ permissions }}"
            }
            Self::GUARD_ROLE_LIMITED => "This command is limited to specific roles on this server.",
            Self::RATE_LIMITED => {
                "You are using `{{ command }}` too quickly. Try again in {{ retry }}."
            }
            Self::USAGE_ERROR => "{{ detail }}\nUsage: `{{ usage }}`",
            Self::RESOLUTION_FAILED => {
                "Invalid value for `{{ argument }}`: {{ reason }}\nUsage: `{{ usage }}`"
            }
            Self::VALIDATION_FAILED => "Invalid value for `{{ argument }}`: {{ reason }}",
            Self::REJECTED => "{{ reason }}",
            Self::INTERNAL_ERROR => {
                "Something went wrong while running `{{ command }}`. The error has been logged."
            }
            Self::ARGUMENT_COUNT => "Expected at least {{ expected }} argument(s) but got {{ got }}.",
            Self::INVALID_VALUE => "`{{ value }}` is not a valid {{ type }}",
            Self::NOT_A_NUMBER => "`{{ value }}` is not a number",
            Self::OUT_OF_RANGE => "value out of range: `{{ value }}` must be between {{ min }} and {{ max }}",
            Self::NOT_A_BOOLEAN => "`{{ value }}` is not yes/no",
            Self::INVALID_DURATION => "`{{ value }}` is not a duration (try `1d2h` or `90s`)",
            Self::INVALID_CHOICE => "`{{ value }}` must be one of: {{ choices }}",
            Self::NO_SUCH_USER => "no such user: `{{ value }}`",
            Self::NO_SUCH_MEMBER => "no such member: `{{ value }}`",
            Self::NO_SUCH_ROLE => "no such role: `{{ value }}`",
            Self::NO_SUCH_CHANNEL => "no such channel: `{{ value }}`",
            Self::GUILD_REQUIRED => "`{{ value }}` can only be looked up inside a server",
            Self::LOOKUP_TIMED_OUT => "lookup timed out",
            Self::LOOKUP_FAILED => "lookup failed",
            Self::LIMIT_UNKNOWN_COMMAND => "There is no command named `{{ command }}`.",
            Self::LIMIT_NO_ROLES => "Name at least one role, separated by commas.",
            Self::LIMIT_SET => "`{{ command }}` is now limited to: {{ roles }}",
            Self::LIMIT_CLEARED => "Removed role limits from `{{ command }}`.",
            _ => return None,
        };
        Some(text)
    }
}

/// String loader bound to one language.
#[derive(Clone)]
pub struct ResourceLoader {
    lang: String,
    localizer: Option<BoxedLocalizer>,
}

impl ResourceLoader {
    pub fn new(lang: impl Into<String>, localizer: Option<BoxedLocalizer>) -> Self {
        Self {
            lang: lang.into(),
            localizer,
        }
    }

    /// A loader that only knows the built-in English strings.
    pub fn english() -> Self {
        Self::new("en", None)
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Renders `key` with the given substitutions.
    ///
    /// Lookup order: localizer for this language, built-in English table,
    /// then the key itself.
    pub fn get(&self, key: &str, subs: &Substitutions) -> String {
        if let Some(text) = self
            .localizer
            .as_ref()
            .and_then(|l| l.resolve_string(&self.lang, key, subs))
        {
            return text;
        }
        match BaseStrings::english(key) {
            Some(template) => interpolate(template, subs),
            None => key.to_string(),
        }
    }

    /// [`get`](Self::get) with inline `(name, value)` pairs.
    pub fn get_with(&self, key: &str, pairs: &[(&str, &str)]) -> String {
        let subs = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.get(key, &subs)
    }
}

impl fmt::Debug for ResourceLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLoader")
            .field("lang", &self.lang)
            .field("localized", &self.localizer.is_some())
            .finish()
    }
}

impl PartialEq for ResourceLoader {
    fn eq(&self, other: &Self) -> bool {
        self.lang == other.lang
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use herald_core::Localizer;

    use super::*;

    struct French;

    impl Localizer for French {
        fn resolve_string(&self, lang: &str, key: &str, subs: &Substitutions) -> Option<String> {
            (lang == "fr" && key == BaseStrings::NOT_A_NUMBER)
                .then(|| interpolate("`{{ value }}` n'est pas un nombre", subs))
        }
    }

    #[test]
    fn test_english_fallback() {
        let loader = ResourceLoader::english();
        assert_eq!(
            loader.get_with(BaseStrings::NOT_A_NUMBER, &[("value", "five")]),
            "`five` is not a number"
        );
    }

    #[test]
    fn test_localizer_takes_precedence() {
        let loader = ResourceLoader::new("fr", Some(Arc::new(French)));
        assert_eq!(
            loader.get_with(BaseStrings::NOT_A_NUMBER, &[("value", "cinq")]),
            "`cinq` n'est pas un nombre"
        );
        // keys the localizer lacks still render in English
        assert_eq!(loader.get(BaseStrings::LOOKUP_TIMED_OUT, &Substitutions::new()), "lookup timed out");
    }

    #[test]
    fn test_unknown_key_renders_as_key() {
        let loader = ResourceLoader::english();
        assert_eq!(loader.get("custom.key", &Substitutions::new()), "custom.key");
    }
}
