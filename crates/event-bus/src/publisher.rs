use std::sync::Arc;

use async_trait::async_trait;

use crate::contracts::IntegrationEvent;
use crate::error::Result;
use crate::message::Message;

/// Outbound side of the pub/sub bus.
///
/// Delivery is at-least-once and unordered across topics. Implementations
/// must be thread-safe (Send + Sync).
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes a message to its topic.
    async fn publish(&self, message: Message) -> Result<()>;
}

#[async_trait]
impl<P: Publisher + ?Sized> Publisher for Arc<P> {
    async fn publish(&self, message: Message) -> Result<()> {
        (**self).publish(message).await
    }
}

/// Serializes a typed event and publishes it on its topic.
pub async fn publish_event<P, E>(publisher: &P, event: &E) -> Result<()>
where
    P: Publisher + ?Sized,
    E: IntegrationEvent,
{
    let message = Message::for_event(event)?;
    publisher.publish(message).await
}

/// Publishes a typed event, logging instead of failing.
///
/// The state change that produced the event has already happened and is not
/// rolled back; the counterpart domain stays stale until a later event
/// reconciles it. Returns whether the bus accepted the event.
pub async fn publish_best_effort<P, E>(publisher: &P, event: &E) -> bool
where
    P: Publisher + ?Sized,
    E: IntegrationEvent,
{
    match publish_event(publisher, event).await {
        Ok(()) => true,
        Err(e) => {
            metrics::counter!("bus_publish_failures_total", "topic" => E::TOPIC).increment(1);
            tracing::warn!(topic = E::TOPIC, error = %e, "publish failed; state change kept");
            false
        }
    }
}
