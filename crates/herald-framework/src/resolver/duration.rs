//! Duration shorthand such as `1d2h` or `90s`.
//!
//! Grammar: one or more `<integer><unit>` groups, units `w d h m s`
//! (case-insensitive), no separators. Zero durations are rejected.

use std::time::Duration;

use async_trait::async_trait;

use crate::context::InvocationContext;
use crate::error::ResolveError;
use crate::strings::BaseStrings;
use crate::value::ArgValue;

use super::Resolver;

const UNITS: [(char, u64); 5] = [
    ('w', 7 * 24 * 60 * 60),
    ('d', 24 * 60 * 60),
    ('h', 60 * 60),
    ('m', 60),
    ('s', 1),
];

fn unit_seconds(unit: char) -> Option<u64> {
    let unit = unit.to_ascii_lowercase();
    UNITS.iter().find(|(u, _)| *u == unit).map(|(_, secs)| *secs)
}

/// Parses duration shorthand. Returns `None` for malformed input and for
/// durations that add up to zero.
pub fn parse_shorthand(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for ch in input.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let secs = unit_seconds(ch)?;
        if digits.is_empty() {
            return None;
        }
        let count: u64 = digits.parse().ok()?;
        total = total.checked_add(count.checked_mul(secs)?)?;
        digits.clear();
    }

    // trailing number without a unit
    if !digits.is_empty() || total == 0 {
        return None;
    }
    Some(Duration::from_secs(total))
}

/// Formats whole seconds of `duration` largest unit first, e.g. `1d2h`.
/// Sub-second parts are dropped; a zero duration renders as `0s`.
pub fn format_shorthand(duration: Duration) -> String {
    let mut remaining = duration.as_secs();
    if remaining == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for (unit, secs) in UNITS {
        let count = remaining / secs;
        if count > 0 {
            out.push_str(&count.to_string());
            out.push(unit);
            remaining %= secs;
        }
    }
    out
}

/// Resolves shorthand into [`ArgValue::Duration`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationResolver;

#[async_trait]
impl Resolver for DurationResolver {
    fn validate(&self, value: &ArgValue) -> bool {
        match value {
            ArgValue::Duration(d) => !d.is_zero(),
            ArgValue::Text(raw) => parse_shorthand(raw).is_some(),
            _ => false,
        }
    }

    async fn resolve(
        &self,
        ctx: &InvocationContext,
        _arg: &str,
        raw: &str,
    ) -> Result<ArgValue, ResolveError> {
        parse_shorthand(raw).map(ArgValue::Duration).ok_or_else(|| {
            ResolveError::failed(
                ctx.resources()
                    .get_with(BaseStrings::INVALID_DURATION, &[("value", raw)]),
            )
        })
    }
}
