//! Notification rendering and delivery.
//!
//! Events are rendered into embeds by [`render`], routed to a logical
//! [`Endpoint`] and posted through a [`NotificationChannel`].

pub mod channels;
pub mod render;
mod router;

pub use channels::{DiscordChannel, DiscordConfig, NotificationChannel};
pub use render::{Embed, EmbedAuthor, EmbedField, render_event, render_next_poll_notice};
pub use router::{
    DeliveryResult, DispatchSummary, Endpoint, EndpointSelector, EventCategory, NotificationRouter,
    RoutingTable,
};
