//! Replies to the originating channel.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::foundation::{ChannelContext, ResponderError};

/// Sends text back to the channel a command was invoked from.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn send(&self, channel: &ChannelContext, text: &str) -> Result<(), ResponderError>;
}

/// Shared handle to a responder.
pub type BoxedResponder = Arc<dyn Responder>;

/// Drops every reply, logging it at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResponder;

#[async_trait]
impl Responder for NullResponder {
    async fn send(&self, channel: &ChannelContext, text: &str) -> Result<(), ResponderError> {
        debug!(channel = %channel.channel_id, text, "Reply dropped");
        Ok(())
    }
}
