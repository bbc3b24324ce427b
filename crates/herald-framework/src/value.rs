//! Typed argument values.
//!
//! The tokenizer produces one [`ArgValue::Text`] (or [`ArgValue::Absent`])
//! per declared argument; the resolve middleware replaces each text value
//! with the typed value its resolver produced.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use herald_core::{Channel, Member, Role, User};

use crate::resolver::format_shorthand;
use crate::strings::ResourceLoader;

/// A single argument value as it travels through the middleware chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// An optional argument that was not supplied.
    Absent,
    /// Raw or string-typed text.
    Text(String),
    Number(f64),
    Boolean(bool),
    Duration(Duration),
    /// One value out of an enumerated set, stored in its canonical spelling.
    Choice(String),
    User(User),
    Member(Member),
    Role(Role),
    Channel(Channel),
    /// String loader bound to the invocation language, added by `localize`.
    Resource(ResourceLoader),
}

impl ArgValue {
    /// Short name of the variant.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::Duration(_) => "duration",
            Self::Choice(_) => "choice",
            Self::User(_) => "user",
            Self::Member(_) => "member",
            Self::Role(_) => "role",
            Self::Channel(_) => "channel",
            Self::Resource(_) => "resource",
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Text of a [`Text`](Self::Text) or [`Choice`](Self::Choice) value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Choice(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            Self::User(u) => Some(u),
            Self::Member(m) => Some(&m.user),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&Member> {
        match self {
            Self::Member(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_role(&self) -> Option<&Role> {
        match self {
            Self::Role(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&Channel> {
        match self {
            Self::Channel(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_resources(&self) -> Option<&ResourceLoader> {
        match self {
            Self::Resource(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => Ok(()),
            Self::Text(s) | Self::Choice(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Duration(d) => f.write_str(&format_shorthand(*d)),
            Self::User(u) => f.write_str(&u.display_tag()),
            Self::Member(m) => f.write_str(m.display_name()),
            Self::Role(r) => write!(f, "@{}", r.name),
            Self::Channel(c) => write!(f, "#{}", c.name),
            Self::Resource(r) => write!(f, "resources({})", r.lang()),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Duration> for ArgValue {
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

/// The ordered argument list handed from middleware to middleware and
/// finally to the command action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Vec<ArgValue>);

impl Arguments {
    pub fn new(values: Vec<ArgValue>) -> Self {
        Self(values)
    }

    /// Inserts a value in front of every other argument.
    pub fn prepend(&mut self, value: ArgValue) {
        self.0.insert(0, value);
    }

    /// The first resource loader in the list, if `localize` ran.
    pub fn resources(&self) -> Option<&ResourceLoader> {
        self.0.iter().find_map(ArgValue::as_resources)
    }

    pub fn into_inner(self) -> Vec<ArgValue> {
        self.0
    }
}

impl Deref for Arguments {
    type Target = Vec<ArgValue>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Arguments {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<ArgValue>> for Arguments {
    fn from(values: Vec<ArgValue>) -> Self {
        Self(values)
    }
}

impl FromIterator<ArgValue> for Arguments {
    fn from_iter<I: IntoIterator<Item = ArgValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Arguments {
    type Item = ArgValue;
    type IntoIter = std::vec::IntoIter<ArgValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_match_variant() {
        assert_eq!(ArgValue::from(5.0).as_number(), Some(5.0));
        assert_eq!(ArgValue::from("x").as_number(), None);
        assert_eq!(ArgValue::Choice("ban".into()).as_text(), Some("ban"));
        assert!(ArgValue::Absent.is_absent());
    }

    #[test]
    fn test_member_exposes_user() {
        let member = Member::new("g1", User::new("u1", "alice"));
        let value = ArgValue::Member(member);
        assert_eq!(value.as_user().map(|u| u.name.as_str()), Some("alice"));
    }

    #[test]
    fn test_prepend_and_find_resources() {
        let mut args = Arguments::new(vec!["a".into()]);
        args.prepend(ArgValue::Resource(ResourceLoader::english()));
        assert_eq!(args.len(), 2);
        assert_eq!(args.resources().map(|r| r.lang()), Some("en"));
    }

    #[test]
    fn test_display_duration() {
        let value = ArgValue::Duration(Duration::from_secs(93_600));
        assert_eq!(value.to_string(), "1d2h");
    }
}
