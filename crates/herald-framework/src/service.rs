//! [`tower::Service`] adapter for the dispatcher.
//!
//! Transports that already speak tower can stack layers in front of the
//! dispatcher:
//!
//! ```rust,ignore
//! use tower::ServiceBuilder;
//! use tower::limit::ConcurrencyLimitLayer;
//!
//! let service = ServiceBuilder::new()
//!     .layer(ConcurrencyLimitLayer::new(64))
//!     .service(dispatcher.into_service());
//! ```

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tower::Service;

use herald_core::{Actor, ChannelContext};

use crate::dispatcher::{Dispatcher, Outcome};

/// One received message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub text: String,
    pub actor: Actor,
    pub channel: ChannelContext,
}

impl Incoming {
    pub fn new(text: impl Into<String>, actor: Actor, channel: ChannelContext) -> Self {
        Self {
            text: text.into(),
            actor,
            channel,
        }
    }
}

/// A shared dispatcher as a tower service. Always ready; never fails.
#[derive(Debug, Clone)]
pub struct DispatchService {
    dispatcher: Arc<Dispatcher>,
}

impl DispatchService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

impl Service<Incoming> for DispatchService {
    type Response = Outcome;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, incoming: Incoming) -> Self::Future {
        let dispatcher = Arc::clone(&self.dispatcher);

        Box::pin(async move {
            let Incoming {
                text,
                actor,
                channel,
            } = incoming;
            Ok(dispatcher.handle_incoming(&text, actor, channel).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_ready_ok, task};
    use tower::ServiceExt;

    use super::*;
    use crate::command::CommandDescriptor;
    use crate::context::InvocationContext;
    use crate::value::Arguments;

    fn service() -> DispatchService {
        let mut dispatcher = Dispatcher::builder().build().unwrap();
        dispatcher
            .register(
                CommandDescriptor::builder("ping").build().unwrap(),
                |_ctx: Arc<InvocationContext>, _args: Arguments| async { "pong".to_string() },
            )
            .unwrap();
        dispatcher.into_service()
    }

    #[test]
    fn test_always_ready() {
        let mut service = service();
        let mut ready = task::spawn(std::future::poll_fn(|cx| service.poll_ready(cx)));
        assert_ready_ok!(ready.poll());
    }

    #[tokio::test]
    async fn test_oneshot_dispatches() {
        let incoming = Incoming::new("!ping", Actor::new("u1", "a"), ChannelContext::guild("g1", "c1"));
        let outcome = service().oneshot(incoming).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Completed {
                command: "ping".into()
            }
        );

        let ignored = Incoming::new("hello", Actor::new("u1", "a"), ChannelContext::guild("g1", "c1"));
        assert!(service().oneshot(ignored).await.unwrap().is_ignored());
    }
}
