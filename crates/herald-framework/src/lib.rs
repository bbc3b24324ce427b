//! # Herald Framework
//!
//! Turns an already-received message into a command invocation.
//!
//! This layer provides:
//! - Resolver registry converting raw tokens into typed [`ArgValue`]s
//! - Quote-aware argument tokenizer
//! - Command descriptors assembled with an explicit middleware list
//! - Middleware chain executor (resolve, expect, localize, custom)
//! - Per (command, actor) sliding-window rate limiter
//! - The [`Dispatcher`], which runs every stage in order and reports failures
//! - `limit` / `clearlimit` commands managing per-guild role limits
//!
//! ```text
//! text ─▶ match ─▶ guards ─▶ rate limit ─▶ tokenize ─▶ middleware ─▶ action
//!            │         │          │            │            │           │
//!            ▼         ▼          ▼            ▼            ▼           ▼
//!         ignored   denied    rate limited  usage error  arg error  internal error
//! ```

pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod guard;
pub mod limits;
pub mod middleware;
pub mod ratelimit;
pub mod resolver;
pub mod service;
pub mod strings;
pub mod value;

pub use command::{
    ActionResponse, ArgKind, ArgSpec, BoxedAction, CommandAction, CommandDescriptor,
    CommandRegistry, DescriptorBuilder, Guards, RegisteredCommand, normalize,
};
pub use context::{InvocationContext, Services};
pub use dispatcher::{Dispatcher, DispatcherBuilder, DispatcherConfig, Outcome};
pub use error::{
    ActionResult, DispatchError, GuardDenial, RegistrationError, ResolveError, TokenizeError,
};
pub use middleware::{BoxedMiddleware, Intent, Middleware, MiddlewareChain};
pub use ratelimit::{Admission, RateLimitPolicy, RateLimiter};
pub use resolver::{Resolver, ResolverRegistry};
pub use service::{DispatchService, Incoming};
pub use strings::{BaseStrings, ResourceLoader};
pub use value::{ArgValue, Arguments};

pub use tower::BoxError;
