use crate::error::TokenizeError;
use crate::value::ArgValue;

use super::signature::ArgSpec;

/// Reads the next token from `input`.
///
/// Handles:
/// - Whitespace-separated words
/// - Double-quoted groups (`"my role"`), where `\` escapes the next character
/// - Empty quotes (`""`), which yield an empty token
///
/// An unterminated quote runs to the end of the input. Returns the token and
/// the unread rest, or `None` when only whitespace is left.
pub fn next_token(input: &str) -> Option<(String, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }

    let mut current = String::new();
    let mut in_quote = false;
    let mut escape_next = false;

    for (i, ch) in input.char_indices() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_quote => {
                escape_next = true;
            }
            '"' => {
                in_quote = !in_quote;
            }
            c if c.is_whitespace() && !in_quote => {
                return Some((current, &input[i..]));
            }
            _ => {
                current.push(ch);
            }
        }
    }

    Some((current, ""))
}

/// Splits `input` into every token it contains.
pub fn shell_split(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut rest = input;
    while let Some((token, remaining)) = next_token(rest) {
        args.push(token);
        rest = remaining;
    }
    args
}

/// Splits message text into the command word and the argument text.
///
/// The argument text keeps its original spacing. Returns `None` for blank
/// input.
pub fn split_invocation(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    match text.find(char::is_whitespace) {
        Some(i) => Some((&text[..i], &text[i..])),
        None => Some((text, "")),
    }
}

/// Produces exactly one value per declared argument.
///
/// A remainder argument receives the rest of the text with surrounding
/// whitespace trimmed. Missing optional arguments become
/// [`ArgValue::Absent`]; tokens beyond the declared count are ignored.
pub fn tokenize(input: &str, specs: &[ArgSpec]) -> Result<Vec<ArgValue>, TokenizeError> {
    let required = specs.iter().filter(|s| !s.optional).count();
    let mut values = Vec::with_capacity(specs.len());
    let mut rest = input;

    for spec in specs {
        let token = if spec.remainder {
            let text = std::mem::take(&mut rest).trim();
            (!text.is_empty()).then(|| text.to_string())
        } else {
            next_token(rest).map(|(token, remaining)| {
                rest = remaining;
                token
            })
        };

        match token {
            Some(token) => values.push(ArgValue::Text(token)),
            None if spec.optional => values.push(ArgValue::Absent),
            None => {
                return Err(TokenizeError::ArgumentCountMismatch {
                    expected: required,
                    got: values.len(),
                });
            }
        }
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[ArgValue]) -> Vec<&str> {
        values.iter().map(|v| v.as_text().unwrap_or("<absent>")).collect()
    }

    #[test]
    fn test_shell_split_simple() {
        assert_eq!(shell_split("hello world"), vec!["hello", "world"]);
    }

    #[test]
    fn test_shell_split_quoted() {
        assert_eq!(shell_split(r#""hello world" test"#), vec!["hello world", "test"]);
    }

    #[test]
    fn test_apostrophes_are_not_quotes() {
        assert_eq!(shell_split("don't stop"), vec!["don't", "stop"]);
    }

    #[test]
    fn test_escape_inside_quotes() {
        assert_eq!(shell_split(r#""say \"hi\"" x"#), vec![r#"say "hi""#, "x"]);
    }

    #[test]
    fn test_empty_quotes_yield_empty_token() {
        assert_eq!(shell_split(r#"a "" b"#), vec!["a", "", "b"]);
    }

    #[test]
    fn test_shell_split_whitespace_only() {
        assert!(shell_split("   \t  ").is_empty());
    }

    #[test]
    fn test_split_invocation() {
        assert_eq!(split_invocation("  clear    \"my role\" now"), Some(("clear", "    \"my role\" now")));
        assert_eq!(split_invocation("ping"), Some(("ping", "")));
        assert_eq!(split_invocation("   "), None);
    }

    #[test]
    fn test_tokenize_quoted_group() {
        let specs = [ArgSpec::required("role", "Role"), ArgSpec::required("when", "String")];
        let values = tokenize(r#"    "my role" now"#, &specs).unwrap();
        assert_eq!(text(&values), vec!["my role", "now"]);
    }

    #[test]
    fn test_tokenize_too_few() {
        let specs = [ArgSpec::required("role", "Role"), ArgSpec::required("when", "String")];
        assert_eq!(
            tokenize(r#""my role""#, &specs),
            Err(TokenizeError::ArgumentCountMismatch { expected: 2, got: 1 })
        );
        assert_eq!(
            tokenize("", &specs),
            Err(TokenizeError::ArgumentCountMismatch { expected: 2, got: 0 })
        );
    }

    #[test]
    fn test_tokenize_remainder_verbatim() {
        let specs = [ArgSpec::required("user", "User"), ArgSpec::rest("reason", "String")];
        let values = tokenize(r#" bob   spamming "links"  again  "#, &specs).unwrap();
        assert_eq!(text(&values), vec!["bob", r#"spamming "links"  again"#]);
    }

    #[test]
    fn test_tokenize_optional_and_surplus() {
        let specs = [ArgSpec::required("a", "String"), ArgSpec::optional("b", "Number")];
        assert_eq!(text(&tokenize("x", &specs).unwrap()), vec!["x", "<absent>"]);
        assert_eq!(text(&tokenize("x 1 2 3", &specs).unwrap()), vec!["x", "1"]);
    }
}
