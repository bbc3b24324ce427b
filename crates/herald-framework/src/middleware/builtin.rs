use async_trait::async_trait;

use crate::context::InvocationContext;
use crate::error::{DispatchError, ResolveError};
use crate::strings::BaseStrings;
use crate::value::{ArgValue, Arguments};

use super::{Intent, Middleware};

/// Resolves every declared argument with its resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveArguments;

/// Creates the `resolve` middleware.
pub fn resolve() -> ResolveArguments {
    ResolveArguments
}

#[async_trait]
impl Middleware for ResolveArguments {
    fn name(&self) -> &str {
        "resolve"
    }

    fn intent(&self) -> Intent {
        Intent::Resolve
    }

    async fn call(
        &self,
        ctx: &InvocationContext,
        args: Arguments,
    ) -> Result<Arguments, DispatchError> {
        let resolvers = &ctx.services().resolvers;
        let mut resolved = Vec::with_capacity(args.len());

        for (i, value) in args.into_iter().enumerate() {
            let Some(spec) = ctx.command().arguments().get(i) else {
                resolved.push(value);
                continue;
            };
            let value = match value {
                ArgValue::Text(raw) => resolvers
                    .resolve_kind(&spec.kind, ctx, &spec.name, &raw)
                    .await
                    .map_err(|e| DispatchError::ResolutionFailed {
                        argument: spec.name.clone(),
                        reason: match e {
                            ResolveError::Failed { reason } => reason,
                            other => other.to_string(),
                        },
                        usage: ctx.usage(),
                    })?,
                other => other,
            };
            resolved.push(value);
        }

        Ok(Arguments::new(resolved))
    }
}

/// Checks every argument with its resolver's cheap validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectArguments;

/// Creates the `expect` middleware.
pub fn expect() -> ExpectArguments {
    ExpectArguments
}

#[async_trait]
impl Middleware for ExpectArguments {
    fn name(&self) -> &str {
        "expect"
    }

    fn intent(&self) -> Intent {
        Intent::Validate
    }

    async fn call(
        &self,
        ctx: &InvocationContext,
        args: Arguments,
    ) -> Result<Arguments, DispatchError> {
        let resolvers = &ctx.services().resolvers;

        for (spec, value) in ctx.command().arguments().iter().zip(args.iter()) {
            if value.is_absent() {
                continue;
            }
            let valid = resolvers.validate_kind(&spec.kind, value).unwrap_or(false);
            if !valid {
                let shown = value.to_string();
                let kind = spec.kind.to_string();
                return Err(DispatchError::ValidationFailed {
                    argument: spec.name.clone(),
                    reason: ctx.resources().get_with(
                        BaseStrings::INVALID_VALUE,
                        &[("value", shown.as_str()), ("type", kind.as_str())],
                    ),
                });
            }
        }

        Ok(args)
    }
}

/// Prepends a [`ResourceLoader`](crate::strings::ResourceLoader) bound to
/// the invocation language.
#[derive(Debug, Clone, Copy, Default)]
pub struct Localize;

/// Creates the `localize` middleware.
pub fn localize() -> Localize {
    Localize
}

#[async_trait]
impl Middleware for Localize {
    fn name(&self) -> &str {
        "localize"
    }

    fn intent(&self) -> Intent {
        Intent::Localize
    }

    async fn call(
        &self,
        ctx: &InvocationContext,
        mut args: Arguments,
    ) -> Result<Arguments, DispatchError> {
        args.prepend(ArgValue::Resource(ctx.resources()));
        Ok(args)
    }
}

/// A named synchronous argument transform.
///
/// An `Err(reason)` from the closure becomes [`DispatchError::Rejected`].
pub struct MapArguments<F> {
    name: String,
    f: F,
}

/// Creates a custom middleware from a closure.
pub fn map<F>(name: impl Into<String>, f: F) -> MapArguments<F>
where
    F: Fn(Arguments) -> Result<Arguments, String> + Send + Sync + 'static,
{
    MapArguments {
        name: name.into(),
        f,
    }
}

#[async_trait]
impl<F> Middleware for MapArguments<F>
where
    F: Fn(Arguments) -> Result<Arguments, String> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(
        &self,
        _ctx: &InvocationContext,
        args: Arguments,
    ) -> Result<Arguments, DispatchError> {
        (self.f)(args).map_err(|reason| DispatchError::rejected(self.name.clone(), reason))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use herald_core::{Actor, ChannelContext};

    use super::*;
    use crate::command::CommandDescriptor;
    use crate::context::Services;
    use crate::resolver::ResolverRegistry;

    fn context_for(signature: &str) -> InvocationContext {
        let command = CommandDescriptor::builder("test")
            .arguments(signature)
            .build()
            .unwrap();
        InvocationContext::new(
            Actor::new("u1", "alice"),
            ChannelContext::guild("g1", "c1"),
            Arc::new(command),
            Arc::new(Services::new(ResolverRegistry::with_builtins())),
        )
        .with_prefix("!")
    }

    fn args(values: &[&str]) -> Arguments {
        values.iter().map(|v| ArgValue::from(*v)).collect()
    }

    #[tokio::test]
    async fn test_resolve_typed_values() {
        let ctx = context_for("<name>: String, <count>: Number");
        let out = resolve().call(&ctx, args(&["alice", "5"])).await.unwrap();
        assert_eq!(
            out.into_inner(),
            vec![ArgValue::from("alice"), ArgValue::Number(5.0)]
        );
    }

    #[tokio::test]
    async fn test_resolve_failure_names_argument() {
        let ctx = context_for("<name>: String, <count>: Number");
        let err = resolve().call(&ctx, args(&["alice", "five"])).await.unwrap_err();
        match err {
            DispatchError::ResolutionFailed { argument, reason, usage } => {
                assert_eq!(argument, "count");
                assert!(reason.contains("not a number"));
                assert_eq!(usage, "!test <name> <count>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_absent_stays_absent() {
        let ctx = context_for("<name>: String, [count]: Number");
        let input = Arguments::new(vec![ArgValue::from("bob"), ArgValue::Absent]);
        let out = resolve().call(&ctx, input).await.unwrap();
        assert_eq!(out[1], ArgValue::Absent);
    }

    #[tokio::test]
    async fn test_expect_reports_constraint() {
        let ctx = context_for("<mode>: ['ban', 'kick']");
        let err = expect().call(&ctx, args(&["mute"])).await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::ValidationFailed {
                argument: "mode".into(),
                reason: "`mute` is not a valid ban|kick".into(),
            }
        );
        assert!(expect().call(&ctx, args(&["kick"])).await.is_ok());
    }

    #[tokio::test]
    async fn test_localize_prepends_loader() {
        let ctx = context_for("<name>").with_lang("de");
        let out = localize().call(&ctx, args(&["x"])).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.resources().map(|r| r.lang()), Some("de"));
    }

    #[tokio::test]
    async fn test_map_rejection() {
        let ctx = context_for("<name>");
        let even = map("even", |args: Arguments| {
            match args.first().and_then(ArgValue::as_number) {
                Some(n) if n % 2.0 == 0.0 => Ok(args),
                _ => Err("expected an even number".to_string()),
            }
        });
        let err = even
            .call(&ctx, Arguments::new(vec![ArgValue::Number(3.0)]))
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::rejected("even", "expected an even number"));
        assert!(even.call(&ctx, Arguments::new(vec![ArgValue::Number(4.0)])).await.is_ok());
    }
}
