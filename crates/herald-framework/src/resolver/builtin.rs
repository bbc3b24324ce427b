//! Scalar resolvers: strings, numbers, booleans and enumerated choices.

use async_trait::async_trait;

use crate::context::InvocationContext;
use crate::error::ResolveError;
use crate::strings::BaseStrings;
use crate::value::ArgValue;

use super::Resolver;

/// Accepts any text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringResolver;

#[async_trait]
impl Resolver for StringResolver {
    fn validate(&self, value: &ArgValue) -> bool {
        matches!(value, ArgValue::Text(_))
    }

    async fn resolve(
        &self,
        _ctx: &InvocationContext,
        _arg: &str,
        raw: &str,
    ) -> Result<ArgValue, ResolveError> {
        Ok(ArgValue::Text(raw.to_string()))
    }
}

/// Parses a finite floating-point number, optionally bounded.
#[derive(Debug, Clone, Copy)]
pub struct NumberResolver {
    min: f64,
    max: f64,
}

impl NumberResolver {
    /// An unbounded number resolver.
    pub fn new() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// A resolver accepting only values in `min..=max`.
    pub fn with_range(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn parse(raw: &str) -> Option<f64> {
        raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
    }

    fn in_range(&self, n: f64) -> bool {
        n >= self.min && n <= self.max
    }
}

impl Default for NumberResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resolver for NumberResolver {
    fn validate(&self, value: &ArgValue) -> bool {
        match value {
            ArgValue::Number(n) => self.in_range(*n),
            ArgValue::Text(raw) => Self::parse(raw).is_some_and(|n| self.in_range(n)),
            _ => false,
        }
    }

    async fn resolve(
        &self,
        ctx: &InvocationContext,
        _arg: &str,
        raw: &str,
    ) -> Result<ArgValue, ResolveError> {
        let resources = ctx.resources();
        let n = Self::parse(raw).ok_or_else(|| {
            ResolveError::failed(resources.get_with(BaseStrings::NOT_A_NUMBER, &[("value", raw)]))
        })?;
        if !self.in_range(n) {
            let (min, max) = (self.min.to_string(), self.max.to_string());
            return Err(ResolveError::failed(resources.get_with(
                BaseStrings::OUT_OF_RANGE,
                &[("value", raw), ("min", min.as_str()), ("max", max.as_str())],
            )));
        }
        Ok(ArgValue::Number(n))
    }
}

/// Parses yes/no style answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanResolver;

impl BooleanResolver {
    fn parse(raw: &str) -> Option<bool> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" | "enable" | "enabled" => Some(true),
            "false" | "no" | "n" | "off" | "0" | "disable" | "disabled" => Some(false),
            _ => None,
        }
    }
}

#[async_trait]
impl Resolver for BooleanResolver {
    fn validate(&self, value: &ArgValue) -> bool {
        match value {
            ArgValue::Boolean(_) => true,
            ArgValue::Text(raw) => Self::parse(raw).is_some(),
            _ => false,
        }
    }

    async fn resolve(
        &self,
        ctx: &InvocationContext,
        _arg: &str,
        raw: &str,
    ) -> Result<ArgValue, ResolveError> {
        Self::parse(raw).map(ArgValue::Boolean).ok_or_else(|| {
            ResolveError::failed(
                ctx.resources()
                    .get_with(BaseStrings::NOT_A_BOOLEAN, &[("value", raw)]),
            )
        })
    }
}

/// Accepts one value of a fixed set, compared case-insensitively.
///
/// The resolved [`ArgValue::Choice`] carries the spelling from the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceResolver {
    choices: Vec<String>,
}

impl ChoiceResolver {
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    fn find(&self, raw: &str) -> Option<&String> {
        let raw = raw.trim();
        self.choices.iter().find(|c| c.eq_ignore_ascii_case(raw))
    }
}

#[async_trait]
impl Resolver for ChoiceResolver {
    fn validate(&self, value: &ArgValue) -> bool {
        match value {
            ArgValue::Choice(s) | ArgValue::Text(s) => self.find(s).is_some(),
            _ => false,
        }
    }

    async fn resolve(
        &self,
        ctx: &InvocationContext,
        _arg: &str,
        raw: &str,
    ) -> Result<ArgValue, ResolveError> {
        match self.find(raw) {
            Some(choice) => Ok(ArgValue::Choice(choice.clone())),
            None => {
                let choices = self.choices.join(", ");
                Err(ResolveError::failed(ctx.resources().get_with(
                    BaseStrings::INVALID_CHOICE,
                    &[("value", raw), ("choices", choices.as_str())],
                )))
            }
        }
    }
}
