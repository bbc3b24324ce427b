//! Argument declarations.
//!
//! Arguments are declared either with [`ArgSpec`] constructors or with the
//! bracket syntax:
//!
//! ```text
//! <name>: Type        required
//! [name]: Type        optional
//! <...name>: Type     consumes the rest of the text (last argument only)
//! <mode>: ['a', 'b']  inline choice set
//! <name>              type defaults to String
//! ```

use std::collections::HashSet;
use std::fmt;

use crate::error::RegistrationError;

/// What an argument resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgKind {
    /// A resolver type tag.
    Type(String),
    /// One of a fixed set of values.
    Choice(Vec<String>),
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(tag) => f.write_str(tag),
            Self::Choice(choices) => write!(f, "{}", choices.join("|")),
        }
    }
}

/// One declared positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: String,
    pub kind: ArgKind,
    pub optional: bool,
    /// Takes the remaining text verbatim instead of one token.
    pub remainder: bool,
}

impl ArgSpec {
    pub fn required(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ArgKind::Type(tag.into()),
            optional: false,
            remainder: false,
        }
    }

    pub fn optional(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            optional: true,
            ..Self::required(name, tag)
        }
    }

    /// A required argument consuming the rest of the text.
    pub fn rest(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            remainder: true,
            ..Self::required(name, tag)
        }
    }

    pub fn choice<I, S>(name: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: ArgKind::Choice(choices.into_iter().map(Into::into).collect()),
            optional: false,
            remainder: false,
        }
    }

    /// Marks the argument optional (builder pattern).
    pub fn into_optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// The resolver tag, `None` for inline choices.
    pub fn type_tag(&self) -> Option<&str> {
        match &self.kind {
            ArgKind::Type(tag) => Some(tag),
            ArgKind::Choice(_) => None,
        }
    }

    /// Usage fragment such as `<name>`, `[name]` or `<...name>`.
    pub fn usage_fragment(&self) -> String {
        let dots = if self.remainder { "..." } else { "" };
        if self.optional {
            format!("[{dots}{}]", self.name)
        } else {
            format!("<{dots}{}>", self.name)
        }
    }
}

/// Parses a bracket-syntax declaration list.
pub fn parse_signature(input: &str) -> Result<Vec<ArgSpec>, RegistrationError> {
    let specs = split_top_level(input, ',')
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_item)
        .collect::<Result<Vec<_>, _>>()?;
    check_signature(&specs)?;
    Ok(specs)
}

/// Checks the structural rules of an argument list.
pub(crate) fn check_signature(specs: &[ArgSpec]) -> Result<(), RegistrationError> {
    let mut seen = HashSet::new();
    let mut optional_seen = false;

    for (i, spec) in specs.iter().enumerate() {
        if spec.name.trim().is_empty() {
            return Err(invalid(format!("argument #{} has no name", i + 1)));
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(invalid(format!("duplicate argument name '{}'", spec.name)));
        }
        if spec.remainder && i + 1 != specs.len() {
            return Err(invalid(format!(
                "'{}' consumes the remaining text but is not the last argument",
                spec.name
            )));
        }
        if spec.optional {
            optional_seen = true;
        } else if optional_seen {
            return Err(invalid(format!(
                "required argument '{}' follows an optional one",
                spec.name
            )));
        }
        match &spec.kind {
            ArgKind::Type(tag) if tag.trim().is_empty() => {
                return Err(invalid(format!("argument '{}' has an empty type", spec.name)));
            }
            ArgKind::Choice(choices) if choices.is_empty() => {
                return Err(invalid(format!("argument '{}' has no choices", spec.name)));
            }
            _ => {}
        }
    }
    Ok(())
}

fn invalid(reason: String) -> RegistrationError {
    RegistrationError::InvalidArgumentSpec(reason)
}

/// Splits on `sep` outside brackets and quotes.
fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, ch) in input.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '[' | '<') => depth += 1,
            (None, ']' | '>') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn parse_item(item: &str) -> Result<ArgSpec, RegistrationError> {
    let (close, optional) = match item.chars().next() {
        Some('<') => ('>', false),
        Some('[') => (']', true),
        _ => return Err(invalid(format!("'{item}' must start with '<' or '['"))),
    };
    let end = item[1..]
        .find(close)
        .map(|i| i + 1)
        .ok_or_else(|| invalid(format!("'{item}' is missing a closing '{close}'")))?;

    let raw_name = item[1..end].trim();
    let (name, remainder) = match raw_name.strip_prefix("...") {
        Some(name) => (name.trim(), true),
        None => (raw_name, false),
    };

    let rest = item[end + 1..].trim();
    let kind = if rest.is_empty() {
        ArgKind::Type("String".to_string())
    } else {
        let ty = rest
            .strip_prefix(':')
            .ok_or_else(|| invalid(format!("unexpected '{rest}' after '{raw_name}'")))?
            .trim();
        parse_kind(ty)?
    };

    Ok(ArgSpec {
        name: name.to_string(),
        kind,
        optional,
        remainder,
    })
}

fn parse_kind(ty: &str) -> Result<ArgKind, RegistrationError> {
    if let Some(inner) = ty.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        let choices: Vec<String> = split_top_level(inner, ',')
            .into_iter()
            .map(|c| unquote(c.trim()).to_string())
            .filter(|c| !c.is_empty())
            .collect();
        return Ok(ArgKind::Choice(choices));
    }
    if ty.is_empty() || !ty.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(invalid(format!("'{ty}' is not a valid type name")));
    }
    Ok(ArgKind::Type(ty.to_string()))
}

fn unquote(s: &str) -> &str {
    for q in ['\'', '"'] {
        if let Some(inner) = s.strip_prefix(q).and_then(|s| s.strip_suffix(q)) {
            return inner;
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_signature() {
        let err =
            parse_signature("<user>: Member, <mode>: ['ban', \"kick\"], [days]: Number, <...reason>: String")
                .unwrap_err();
        // a required remainder after an optional argument is rejected
        assert!(matches!(err, RegistrationError::InvalidArgumentSpec(_)));

        let specs =
            parse_signature("<user>: Member, <mode>: ['ban', \"kick\"], [...reason]: String").unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0], ArgSpec::required("user", "Member"));
        assert_eq!(specs[1], ArgSpec::choice("mode", ["ban", "kick"]));
        assert!(specs[2].optional && specs[2].remainder);
        assert_eq!(specs[2].usage_fragment(), "[...reason]");
    }

    #[test]
    fn test_type_defaults_to_string() {
        let specs = parse_signature("<text>").unwrap();
        assert_eq!(specs, vec![ArgSpec::required("text", "String")]);
        assert!(parse_signature("").unwrap().is_empty());
    }

    #[test]
    fn test_structural_rules() {
        assert!(parse_signature("<...a>: String, <b>: String").is_err());
        assert!(parse_signature("[a]: String, <b>: String").is_err());
        assert!(parse_signature("<a>: String, <a>: Number").is_err());
        assert!(parse_signature("<a>: []").is_err());
        assert!(parse_signature("a: String").is_err());
        assert!(parse_signature("<a>: Num ber").is_err());
        assert!(parse_signature("<a: String").is_err());
    }
}
