//! Integration layer - interfaces to external collaborators.
//!
//! The pipeline consumes these through trait objects injected at bootstrap:
//! - [`EntityLookup`] for reference resolvers
//! - [`SettingStore`] for per-guild prefix, language and command limits
//! - [`Localizer`] for user-facing strings
//! - [`LogSink`] for operator-visible error reports
//! - [`Responder`] for replies to the originating channel

pub mod localization;
pub mod log;
pub mod lookup;
pub mod responder;
pub mod settings;

pub use localization::{BoxedLocalizer, Localizer, Substitutions, interpolate};
pub use log::{BoxedLogSink, LogLevel, LogSink, TracingLogSink};
pub use lookup::{BoxedLookup, EntityLookup, NullLookup};
pub use responder::{BoxedResponder, NullResponder, Responder};
pub use settings::{BoxedSettings, MemorySettings, SettingScope, SettingStore, get_setting};
