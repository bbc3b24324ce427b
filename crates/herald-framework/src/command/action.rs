//! Command actions.
//!
//! An action is the command's effect. Any async function or closure taking
//! `(Arc<InvocationContext>, Arguments)` works, as long as its return type
//! implements [`ActionResponse`]:
//!
//! ```rust,ignore
//! // No return value
//! async fn ping(_ctx: Arc<InvocationContext>, _args: Arguments) {}
//!
//! // A String is sent back to the channel
//! async fn echo(_ctx: Arc<InvocationContext>, args: Arguments) -> String {
//!     args[0].to_string()
//! }
//!
//! // Errors are logged by the dispatcher and reported generically
//! async fn ban(ctx: Arc<InvocationContext>, args: Arguments) -> Result<String, BoxError> {
//!     Ok(format!("banned {}", args[0]))
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tower::BoxError;

use crate::context::InvocationContext;
use crate::error::ActionResult;
use crate::value::Arguments;

// ============================================================================
// ActionResponse - Handle action return values
// ============================================================================

/// Types an action may return.
#[async_trait]
pub trait ActionResponse: Send {
    /// Delivers the value and reports whether the action succeeded.
    async fn into_result(self, ctx: Arc<InvocationContext>) -> ActionResult;
}

/// Nothing to deliver.
#[async_trait]
impl ActionResponse for () {
    async fn into_result(self, _ctx: Arc<InvocationContext>) -> ActionResult {
        Ok(())
    }
}

/// Sent as a reply to the originating channel.
#[async_trait]
impl ActionResponse for String {
    async fn into_result(self, ctx: Arc<InvocationContext>) -> ActionResult {
        ctx.reply(&self).await.map_err(Into::into)
    }
}

#[async_trait]
impl ActionResponse for &'static str {
    async fn into_result(self, ctx: Arc<InvocationContext>) -> ActionResult {
        ctx.reply(self).await.map_err(Into::into)
    }
}

/// On `Some`, the inner value is delivered. On `None`, nothing happens.
#[async_trait]
impl<T: ActionResponse> ActionResponse for Option<T> {
    async fn into_result(self, ctx: Arc<InvocationContext>) -> ActionResult {
        match self {
            Some(t) => t.into_result(ctx).await,
            None => Ok(()),
        }
    }
}

/// On `Ok`, the inner value is delivered. On `Err`, the action failed.
#[async_trait]
impl<T, E> ActionResponse for Result<T, E>
where
    T: ActionResponse,
    E: Into<BoxError> + Send,
{
    async fn into_result(self, ctx: Arc<InvocationContext>) -> ActionResult {
        match self {
            Ok(t) => t.into_result(ctx).await,
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// CommandAction
// ============================================================================

/// The effect of a command, invoked with fully processed arguments.
pub trait CommandAction: Send + Sync + 'static {
    fn call(&self, ctx: Arc<InvocationContext>, args: Arguments) -> BoxFuture<'static, ActionResult>;
}

impl<F, Fut, Res> CommandAction for F
where
    F: Fn(Arc<InvocationContext>, Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: ActionResponse + 'static,
{
    fn call(&self, ctx: Arc<InvocationContext>, args: Arguments) -> BoxFuture<'static, ActionResult> {
        let fut = (self)(Arc::clone(&ctx), args);
        Box::pin(async move { fut.await.into_result(ctx).await })
    }
}

/// A type-erased action stored in the registry.
pub type BoxedAction = Arc<dyn CommandAction>;

/// Converts an action into a [`BoxedAction`].
pub fn into_action<A: CommandAction>(action: A) -> BoxedAction {
    Arc::new(action)
}
