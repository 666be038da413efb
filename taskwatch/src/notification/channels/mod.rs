//! Delivery channels for rendered messages.

mod discord;

pub use discord::{DiscordChannel, DiscordConfig};

use async_trait::async_trait;

use super::render::Embed;
use crate::Result;

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Check if the channel can deliver anything.
    fn is_enabled(&self) -> bool;

    /// Deliver one message. Success means the remote end accepted it.
    async fn send(&self, embed: &Embed) -> Result<()>;
}
