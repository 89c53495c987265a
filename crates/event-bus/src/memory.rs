use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::{BusError, Message, Result, publisher::Publisher};

#[derive(Default)]
struct BusState {
    published: Vec<Message>,
    subscribers: Vec<mpsc::UnboundedSender<Message>>,
}

/// In-memory pub/sub bus.
///
/// Every accepted message is forwarded to each live subscriber. A bus built
/// with [`InMemoryBus::recording`] also keeps every accepted message in a
/// log for inspection; redelivering a message from the log simulates the
/// duplicate deliveries an at-least-once transport produces.
#[derive(Clone, Default)]
pub struct InMemoryBus {
    state: Arc<Mutex<BusState>>,
    fail_on_publish: Arc<AtomicBool>,
    record: bool,
}

impl InMemoryBus {
    /// Creates a new bus with no subscribers that keeps no log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new bus that logs every accepted message.
    pub fn recording() -> Self {
        Self {
            record: true,
            ..Self::default()
        }
    }

    /// Registers a subscriber that receives every message published from now on.
    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().await.subscribers.push(tx);
        rx
    }

    /// Makes subsequent publishes fail until reset.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.fail_on_publish.store(fail, Ordering::SeqCst);
    }

    /// Returns a copy of every message accepted so far, in publish order.
    /// Always empty unless the bus is recording.
    pub async fn published(&self) -> Vec<Message> {
        self.state.lock().await.published.clone()
    }

    /// Returns the accepted messages for one topic, in publish order.
    pub async fn published_on(&self, topic: &str) -> Vec<Message> {
        self.state
            .lock()
            .await
            .published
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Returns the number of messages accepted so far.
    pub async fn message_count(&self) -> usize {
        self.state.lock().await.published.len()
    }

    /// Delivers an already published message to the subscribers again.
    ///
    /// The message keeps its ID and is not appended to the log a second time.
    pub async fn redeliver(&self, message: Message) {
        tracing::debug!(message_id = %message.message_id, topic = %message.topic, "redelivering message");
        let mut state = self.state.lock().await;
        state
            .subscribers
            .retain(|tx| tx.send(message.clone()).is_ok());
    }
}

#[async_trait]
impl Publisher for InMemoryBus {
    async fn publish(&self, message: Message) -> Result<()> {
        if self.fail_on_publish.load(Ordering::SeqCst) {
            return Err(BusError::PublishFailed {
                topic: message.topic,
                reason: "bus unavailable".to_string(),
            });
        }

        let mut state = self.state.lock().await;
        // Drop subscribers whose receiver is gone.
        state
            .subscribers
            .retain(|tx| tx.send(message.clone()).is_ok());

        metrics::counter!("bus_messages_published_total", "topic" => message.topic.clone())
            .increment(1);
        tracing::debug!(message_id = %message.message_id, topic = %message.topic, "message published");
        if self.record {
            state.published.push(message);
        }

        Ok(())
    }
}
