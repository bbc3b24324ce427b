//! Localized string lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Named values substituted into a localized template.
pub type Substitutions = BTreeMap<String, String>;

/// Resolves string keys in a language.
///
/// Returns `None` when the language has no entry for the key so callers can
/// fall back to a built-in string.
pub trait Localizer: Send + Sync {
    fn resolve_string(&self, lang: &str, key: &str, subs: &Substitutions) -> Option<String>;
}

/// Shared handle to a localizer.
pub type BoxedLocalizer = Arc<dyn Localizer>;

/// Replaces `{{ name }}` placeholders in `template`.
///
/// Unknown placeholders are left as written.
pub fn interpolate(template: &str, subs: &Substitutions) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                match subs.get(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
