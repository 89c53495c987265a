//! Static topic → handler table and the dispatch loop.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use event_bus::{IntegrationEvent, Message};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::mpsc;

use crate::error::{Result, RouteError};

type Handler = Arc<dyn Fn(Message) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Builds an [`EventRouter`]. Routes are fixed once `build` is called.
#[derive(Default)]
pub struct RouterBuilder {
    routes: HashMap<&'static str, Handler>,
}

impl RouterBuilder {
    /// Routes messages on `E::TOPIC` to `handler`, decoding the payload as `E`.
    ///
    /// Registering a topic twice keeps the last handler.
    pub fn route<E, F, Fut>(mut self, handler: F) -> Self
    where
        E: IntegrationEvent + 'static,
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: Handler = Arc::new(move |message: Message| {
            let handler = Arc::clone(&handler);
            async move {
                let event = message
                    .decode::<E>()
                    .map_err(|source| RouteError::MalformedPayload {
                        topic: E::TOPIC,
                        message_id: message.message_id,
                        source,
                    })?;
                handler(event).await;
                Ok(())
            }
            .boxed()
        });

        if self.routes.insert(E::TOPIC, erased).is_some() {
            tracing::warn!(topic = E::TOPIC, "route registered twice, keeping the last handler");
        }
        self
    }

    pub fn build(self) -> EventRouter {
        EventRouter {
            routes: self.routes,
        }
    }
}

/// Maps inbound messages to handlers by exact topic match.
///
/// Handling is sequential within one message and concurrent across
/// messages when driven by [`EventRouter::run`].
pub struct EventRouter {
    routes: HashMap<&'static str, Handler>,
}

impl EventRouter {
    /// Creates a new router builder.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Returns the routed topics, sorted.
    pub fn topics(&self) -> Vec<&'static str> {
        let mut topics: Vec<_> = self.routes.keys().copied().collect();
        topics.sort_unstable();
        topics
    }

    /// Runs the handler for one message to completion.
    #[tracing::instrument(skip(self, message), fields(message_id = %message.message_id, topic = %message.topic))]
    pub async fn dispatch(&self, message: Message) -> Result<()> {
        let Some(handler) = self.routes.get(message.topic.as_str()) else {
            metrics::counter!("router_messages_dropped_total", "reason" => "unknown_topic")
                .increment(1);
            return Err(RouteError::UnknownTopic(message.topic));
        };

        let topic = message.topic.clone();
        match handler(message).await {
            Ok(()) => {
                metrics::counter!("router_messages_dispatched_total", "topic" => topic)
                    .increment(1);
                Ok(())
            }
            Err(e) => {
                metrics::counter!("router_messages_dropped_total", "reason" => "malformed_payload")
                    .increment(1);
                Err(e)
            }
        }
    }

    /// Consumes messages until the bus closes, handling each one in its own task.
    pub async fn run(self: Arc<Self>, mut inbox: mpsc::UnboundedReceiver<Message>) {
        tracing::info!(topics = ?self.topics(), "event router started");
        while let Some(message) = inbox.recv().await {
            let router = Arc::clone(&self);
            tokio::spawn(async move {
                router.dispatch_or_drop(message).await;
            });
        }
        tracing::info!("bus closed, event router stopped");
    }

    /// Handles queued messages one at a time until the inbox is empty,
    /// including messages published by the handlers themselves. Returns how
    /// many messages were taken off the inbox.
    pub async fn dispatch_pending(&self, inbox: &mut mpsc::UnboundedReceiver<Message>) -> usize {
        let mut handled = 0;
        while let Ok(message) = inbox.try_recv() {
            self.dispatch_or_drop(message).await;
            handled += 1;
        }
        handled
    }

    async fn dispatch_or_drop(&self, message: Message) {
        let message_id = message.message_id;
        if let Err(e) = self.dispatch(message).await {
            tracing::warn!(%message_id, error = %e, "message dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use common::{OrderId, ProductId};
    use event_bus::{OrderPlaced, StockUpdated, topics};

    use super::*;

    fn counting_router(count: Arc<AtomicUsize>) -> EventRouter {
        EventRouter::builder()
            .route(move |_: OrderPlaced| {
                let count = Arc::clone(&count);
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build()
    }

    fn order_placed_message() -> Message {
        Message::for_event(&OrderPlaced {
            order_id: OrderId::new(),
            product_id: ProductId::new("p001"),
            quantity: 1,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn dispatches_by_topic() {
        let count = Arc::new(AtomicUsize::new(0));
        let router = counting_router(Arc::clone(&count));

        router.dispatch(order_placed_message()).await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_topic_is_an_error() {
        let count = Arc::new(AtomicUsize::new(0));
        let router = counting_router(Arc::clone(&count));
        let message = Message::builder()
            .topic("order-cancelled")
            .payload_raw(serde_json::json!({}))
            .build();

        let result = router.dispatch(message).await;

        assert!(matches!(result, Err(RouteError::UnknownTopic(t)) if t == "order-cancelled"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn topic_match_is_exact() {
        let count = Arc::new(AtomicUsize::new(0));
        let router = counting_router(Arc::clone(&count));
        let mut message = order_placed_message();
        message.topic = "Order-Placed".to_string();

        assert!(router.dispatch(message).await.is_err());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_payload_is_an_error() {
        let count = Arc::new(AtomicUsize::new(0));
        let router = counting_router(Arc::clone(&count));
        let message = Message::builder()
            .topic(topics::ORDER_PLACED)
            .payload_raw(serde_json::json!({"quantity": "lots"}))
            .build();

        let result = router.dispatch(message).await;

        assert!(matches!(result, Err(RouteError::MalformedPayload { .. })));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dispatch_pending_drains_the_inbox() {
        let count = Arc::new(AtomicUsize::new(0));
        let router = counting_router(Arc::clone(&count));
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(order_placed_message()).unwrap();
        tx.send(order_placed_message()).unwrap();
        tx.send(
            Message::for_event(&StockUpdated {
                order_id: OrderId::new(),
                product_id: ProductId::new("p001"),
                quantity: 1,
            })
            .unwrap(),
        )
        .unwrap();

        let handled = router.dispatch_pending(&mut rx).await;

        assert_eq!(handled, 3);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn topics_lists_routes() {
        let router = counting_router(Arc::new(AtomicUsize::new(0)));
        assert_eq!(router.topics(), vec![topics::ORDER_PLACED]);
    }
}
