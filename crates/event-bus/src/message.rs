use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contracts::IntegrationEvent;
use crate::error::{BusError, Result};

/// Unique identifier for a published message.
///
/// A redelivered message keeps its ID, which makes duplicates visible in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random message ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message on the bus: a topic name plus a structured payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message.
    pub message_id: MessageId,

    /// The topic the message is addressed to (e.g., "order-placed").
    pub topic: String,

    /// When the message was published.
    pub published_at: DateTime<Utc>,

    /// The event payload as JSON.
    pub payload: serde_json::Value,

    /// Transport metadata (delivery attempt, source service, ...).
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Message {
    /// Creates a new message builder.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Wraps a typed event in a message addressed to the event's topic.
    pub fn for_event<E: IntegrationEvent>(event: &E) -> Result<Self> {
        Ok(Self::builder().topic(E::TOPIC).payload(event)?.build())
    }

    /// Decodes the payload as a typed event, checking that the topic matches.
    pub fn decode<E: IntegrationEvent>(&self) -> Result<E> {
        if self.topic != E::TOPIC {
            return Err(BusError::TopicMismatch {
                expected: E::TOPIC,
                actual: self.topic.clone(),
            });
        }
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

/// Builder for constructing messages.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    message_id: Option<MessageId>,
    topic: Option<String>,
    published_at: Option<DateTime<Utc>>,
    payload: Option<serde_json::Value>,
    metadata: HashMap<String, serde_json::Value>,
}

impl MessageBuilder {
    /// Sets the message ID. If not set, a new ID will be generated.
    pub fn message_id(mut self, id: MessageId) -> Self {
        self.message_id = Some(id);
        self
    }

    /// Sets the topic.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Sets the publish time. If not set, the current time will be used.
    pub fn published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    /// Sets the payload from a serializable value.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> std::result::Result<Self, serde_json::Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Sets the payload from a raw JSON value.
    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Adds a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Builds the message.
    ///
    /// A missing topic becomes the empty string, which no route matches.
    pub fn build(self) -> Message {
        Message {
            message_id: self.message_id.unwrap_or_default(),
            topic: self.topic.unwrap_or_default(),
            published_at: self.published_at.unwrap_or_else(Utc::now),
            payload: self.payload.unwrap_or(serde_json::Value::Null),
            metadata: self.metadata,
        }
    }
}
