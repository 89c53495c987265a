//! Routing error types.

use event_bus::{BusError, MessageId};
use thiserror::Error;

/// Reasons an inbound message could not be handled. Such messages are
/// logged and dropped; nothing is retried.
#[derive(Debug, Error)]
pub enum RouteError {
    /// No handler is registered for the topic.
    #[error("No route for topic '{0}'")]
    UnknownTopic(String),

    /// The payload does not match the topic's contract.
    #[error("Malformed payload on '{topic}' (message {message_id}): {source}")]
    MalformedPayload {
        topic: &'static str,
        message_id: MessageId,
        #[source]
        source: BusError,
    },
}

/// Convenience type alias for routing results.
pub type Result<T> = std::result::Result<T, RouteError>;
