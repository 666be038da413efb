//! Endpoint selection and delivery.
//!
//! Each event is rendered once and sent to exactly one endpoint. A failed
//! delivery is logged and counted; it never stops the remaining events.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::channels::NotificationChannel;
use super::render::{Embed, render_event};
use crate::monitor::{ChangeEvent, ChangeKind, ReviewState};

/// Logical webhook destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// The only endpoint in single-webhook mode.
    Primary,
    Approved,
    Review,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Approved => write!(f, "approved"),
            Self::Review => write!(f, "review"),
        }
    }
}

/// Category used for routing decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Created,
    Approved,
    Rejected,
    InReview,
}

impl From<ChangeKind> for EventCategory {
    fn from(kind: ChangeKind) -> Self {
        match kind.review_state() {
            None => Self::Created,
            Some(ReviewState::Approved) => Self::Approved,
            Some(ReviewState::Rejected) => Self::Rejected,
            Some(ReviewState::InReview) => Self::InReview,
        }
    }
}

/// Decides where an event goes.
pub trait EndpointSelector: Send + Sync {
    fn select(&self, event: &ChangeEvent) -> Endpoint;
}

/// Category to endpoint table with a fallback.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    routes: HashMap<EventCategory, Endpoint>,
    fallback: Endpoint,
}

impl RoutingTable {
    pub fn new(fallback: Endpoint) -> Self {
        Self {
            routes: HashMap::new(),
            fallback,
        }
    }

    pub fn route(mut self, category: EventCategory, endpoint: Endpoint) -> Self {
        self.routes.insert(category, endpoint);
        self
    }

    /// Everything goes to [`Endpoint::Primary`].
    pub fn single() -> Self {
        Self::new(Endpoint::Primary)
    }

    /// Approvals go to [`Endpoint::Approved`]; everything else to
    /// [`Endpoint::Review`].
    pub fn split() -> Self {
        Self::new(Endpoint::Review).route(EventCategory::Approved, Endpoint::Approved)
    }

    pub fn endpoint_for(&self, category: EventCategory) -> Endpoint {
        self.routes.get(&category).copied().unwrap_or(self.fallback)
    }
}

impl EndpointSelector for RoutingTable {
    fn select(&self, event: &ChangeEvent) -> Endpoint {
        self.endpoint_for(EventCategory::from(event.kind))
    }
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    Delivered { endpoint: Endpoint },
    Failed { endpoint: Endpoint, error: String },
    /// No channel is configured for the selected endpoint.
    Unroutable { endpoint: Endpoint },
}

impl DeliveryResult {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Delivered { endpoint }
            | Self::Failed { endpoint, .. }
            | Self::Unroutable { endpoint } => *endpoint,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Counts for one batch of events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
    pub unroutable: usize,
}

impl DispatchSummary {
    fn record(&mut self, result: &DeliveryResult) {
        match result {
            DeliveryResult::Delivered { .. } => self.delivered += 1,
            DeliveryResult::Failed { .. } => self.failed += 1,
            DeliveryResult::Unroutable { .. } => self.unroutable += 1,
        }
    }
}

/// Renders events and hands them to the channel for their endpoint.
pub struct NotificationRouter {
    selector: Arc<dyn EndpointSelector>,
    channels: HashMap<Endpoint, Arc<dyn NotificationChannel>>,
    notice_endpoint: Endpoint,
}

impl NotificationRouter {
    pub fn new(selector: impl EndpointSelector + 'static) -> Self {
        Self {
            selector: Arc::new(selector),
            channels: HashMap::new(),
            notice_endpoint: Endpoint::Primary,
        }
    }

    pub fn with_channel(mut self, endpoint: Endpoint, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.insert(endpoint, channel);
        self
    }

    /// Endpoint that receives informational notices.
    pub fn with_notice_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.notice_endpoint = endpoint;
        self
    }

    pub fn notice_endpoint(&self) -> Endpoint {
        self.notice_endpoint
    }

    pub async fn dispatch(&self, event: &ChangeEvent) -> DeliveryResult {
        let endpoint = self.selector.select(event);
        let result = self.deliver(endpoint, &render_event(event)).await;

        match &result {
            DeliveryResult::Delivered { .. } => {
                info!(id = %event.id(), kind = %event.kind, %endpoint, "Notification delivered");
            }
            DeliveryResult::Failed { error, .. } => {
                warn!(id = %event.id(), kind = %event.kind, %endpoint, error = %error, "Notification delivery failed");
            }
            DeliveryResult::Unroutable { .. } => {
                warn!(id = %event.id(), kind = %event.kind, %endpoint, "No webhook configured for endpoint, event dropped");
            }
        }

        result
    }

    /// Deliver events in order; failures do not stop later events.
    pub async fn dispatch_all(&self, events: &[ChangeEvent]) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for event in events {
            summary.record(&self.dispatch(event).await);
        }
        summary
    }

    /// Send an informational message to the notice endpoint.
    pub async fn announce(&self, embed: &Embed) -> DeliveryResult {
        let endpoint = self.notice_endpoint;
        let result = self.deliver(endpoint, embed).await;
        if let DeliveryResult::Failed { error, .. } = &result {
            warn!(%endpoint, error = %error, "Notice delivery failed");
        }
        result
    }

    async fn deliver(&self, endpoint: Endpoint, embed: &Embed) -> DeliveryResult {
        let Some(channel) = self.channels.get(&endpoint).filter(|c| c.is_enabled()) else {
            return DeliveryResult::Unroutable { endpoint };
        };

        match channel.send(embed).await {
            Ok(()) => DeliveryResult::Delivered { endpoint },
            Err(e) => DeliveryResult::Failed {
                endpoint,
                error: e.to_string(),
            },
        }
    }
}
