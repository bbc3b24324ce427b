//! # Herald
//!
//! A command dispatch pipeline for chat bots.
//!
//! ## Overview
//!
//! Herald takes raw message text, finds the invoked command, checks who may
//! run it and how often, turns the free-text arguments into typed values and
//! calls the command with them. Everything platform specific (looking up
//! members, storing guild settings, sending replies) stays behind small
//! collaborator traits.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐  Incoming  ┌────────────┐  guards, rate limit,  ┌─────────┐
//! │  Runtime  │──────────▶│ Dispatcher │──────────────────────▶│ Command │
//! │ (stream)  │            │            │  tokenize, middleware └─────────┘
//! └───────────┘            └────────────┘
//!                               │ lookup / settings / localize / log / reply
//!                               ▼
//!                         Collaborators
//! ```
//!
//! - **Runtime**: configuration, logging, one task per incoming message
//! - **Dispatcher**: the pipeline, reporting every failure as one message
//! - **Resolvers**: type tags such as `Number` or `Member` mapped to converters
//! - **Middleware**: the per-command argument chain (`resolve`, `expect`,
//!   custom steps, `localize`)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! async fn add(_ctx: Arc<InvocationContext>, args: Arguments) -> String {
//!     let a = args[0].as_number().unwrap_or_default();
//!     let b = args[1].as_number().unwrap_or_default();
//!     format!("{}", a + b)
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut runtime = HeraldRuntime::builder()
//!         .responder(Arc::new(MyResponder))
//!         .build()?;
//!
//!     runtime.register(
//!         CommandDescriptor::builder("add")
//!             .arguments("<a>: Number, <b>: Number")
//!             .ratelimit("5/10s")
//!             .resolve()
//!             .build()?,
//!         add,
//!     )?;
//!
//!     runtime.run(messages).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use herald_core as core;
pub use herald_framework as framework;
pub use herald_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Runtime - main entry point
    pub use herald_runtime::{HeraldConfig, HeraldRuntime, RuntimeStats};

    // Commands
    pub use herald_framework::{
        ArgSpec, ArgValue, Arguments, BoxError, CommandDescriptor, InvocationContext, Outcome,
    };

    // Extension points
    pub use herald_framework::{
        DispatchError, Incoming, Intent, Middleware, ResolveError, Resolver, ResourceLoader,
    };

    // Collaborators
    pub use herald_core::{
        Actor, ChannelContext, EntityLookup, Localizer, LogSink, MemorySettings, Permission,
        Responder, ResponderError, SettingScope, SettingStore,
    };
}
