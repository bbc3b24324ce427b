//! Middleware chain.
//!
//! Each middleware receives the in-progress argument list and either returns
//! the next list or aborts the chain with a [`DispatchError`]. The chain runs
//! strictly in declared order and stops at the first failure.
//!
//! ```text
//! tokens ─▶ [resolve] ─▶ [expect] ─▶ [custom..] ─▶ [localize] ─▶ action
//!               │            │            │
//!               ▼            ▼            ▼
//!     ResolutionFailed  ValidationFailed  Rejected
//! ```
//!
//! Ordering rules, enforced when a descriptor is built:
//! - at most one resolve stage
//! - no validate stage before the resolve stage
//! - no resolve or validate stage after localize, and localize at most once

mod builtin;

pub use builtin::{ExpectArguments, Localize, MapArguments, ResolveArguments, expect, localize, map, resolve};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::context::InvocationContext;
use crate::error::{DispatchError, RegistrationError};
use crate::value::Arguments;

/// The stage a middleware belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Resolve,
    Validate,
    Localize,
    Custom,
}

/// One step of the chain.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Name used in logs and [`DispatchError::Rejected`].
    fn name(&self) -> &str;

    fn intent(&self) -> Intent {
        Intent::Custom
    }

    /// Transforms the argument list or aborts the chain.
    async fn call(
        &self,
        ctx: &InvocationContext,
        args: Arguments,
    ) -> Result<Arguments, DispatchError>;
}

/// Shared handle to a middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An ordered list of middleware.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    layers: Vec<BoxedMiddleware>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: BoxedMiddleware) {
        self.layers.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.layers.iter().map(|m| m.name()).collect()
    }

    pub fn intents(&self) -> Vec<Intent> {
        self.layers.iter().map(|m| m.intent()).collect()
    }

    /// Checks the ordering rules for the chain of `command`.
    pub fn validate_order(&self, command: &str) -> Result<(), RegistrationError> {
        let fail = |reason: String| RegistrationError::MiddlewareOrder {
            command: command.to_string(),
            reason,
        };

        let mut resolved = false;
        let mut validated = false;
        let mut localized = false;

        for middleware in &self.layers {
            let name = middleware.name();
            match middleware.intent() {
                Intent::Resolve | Intent::Validate if localized => {
                    return Err(fail(format!("'{name}' runs after localize")));
                }
                Intent::Resolve if resolved => {
                    return Err(fail(format!("'{name}' resolves the arguments a second time")));
                }
                Intent::Resolve if validated => {
                    return Err(fail(format!("'{name}' resolves after the arguments were validated")));
                }
                Intent::Resolve => resolved = true,
                Intent::Validate => validated = true,
                Intent::Localize if localized => {
                    return Err(fail(format!("'{name}' localizes a second time")));
                }
                Intent::Localize => localized = true,
                Intent::Custom => {}
            }
        }
        Ok(())
    }

    /// Runs every middleware in order, stopping at the first failure.
    pub async fn run(
        &self,
        ctx: &InvocationContext,
        mut args: Arguments,
    ) -> Result<Arguments, DispatchError> {
        for middleware in &self.layers {
            trace!(command = %ctx.command().name(), middleware = middleware.name(), "Running middleware");
            args = middleware.call(ctx, args).await?;
        }
        Ok(args)
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::resolver::tests::context;
    use crate::value::ArgValue;

    struct Counting {
        name: &'static str,
        intent: Intent,
        calls: Arc<AtomicUsize>,
        reject: bool,
    }

    #[async_trait]
    impl Middleware for Counting {
        fn name(&self) -> &str {
            self.name
        }

        fn intent(&self) -> Intent {
            self.intent
        }

        async fn call(
            &self,
            _ctx: &InvocationContext,
            mut args: Arguments,
        ) -> Result<Arguments, DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(DispatchError::rejected(self.name, "nope"));
            }
            args.push(ArgValue::from(self.name));
            Ok(args)
        }
    }

    fn counting(name: &'static str, intent: Intent, reject: bool) -> (BoxedMiddleware, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let middleware = Arc::new(Counting {
            name,
            intent,
            calls: calls.clone(),
            reject,
        });
        (middleware, calls)
    }

    fn chain(intents: &[Intent]) -> MiddlewareChain {
        let mut chain = MiddlewareChain::new();
        for intent in intents {
            chain.push(counting("m", *intent, false).0);
        }
        chain
    }

    #[tokio::test]
    async fn test_runs_in_declared_order() {
        let mut chain = MiddlewareChain::new();
        chain.push(counting("first", Intent::Custom, false).0);
        chain.push(counting("second", Intent::Custom, false).0);
        let args = chain.run(&context(), Arguments::default()).await.unwrap();
        assert_eq!(args.into_inner(), vec![ArgValue::from("first"), ArgValue::from("second")]);
    }

    #[tokio::test]
    async fn test_first_failure_stops_the_chain() {
        let (failing, _) = counting("resolve", Intent::Resolve, true);
        let (after, after_calls) = counting("validate", Intent::Validate, false);
        let mut chain = MiddlewareChain::new();
        chain.push(failing);
        chain.push(after);

        let err = chain.run(&context(), Arguments::default()).await.unwrap_err();
        assert_eq!(err, DispatchError::rejected("resolve", "nope"));
        assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_order_rules() {
        use Intent::*;
        assert!(chain(&[Resolve, Validate, Custom, Localize]).validate_order("x").is_ok());
        assert!(chain(&[Custom, Validate, Localize, Custom]).validate_order("x").is_ok());
        assert!(chain(&[Localize, Resolve]).validate_order("x").is_err());
        assert!(chain(&[Resolve, Localize, Validate]).validate_order("x").is_err());
        assert!(chain(&[Validate, Resolve]).validate_order("x").is_err());
        assert!(chain(&[Resolve, Resolve]).validate_order("x").is_err());
        assert!(chain(&[Localize, Localize]).validate_order("x").is_err());
    }
}
