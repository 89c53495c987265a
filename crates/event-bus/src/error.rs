use thiserror::Error;

/// Errors that can occur when publishing to or reading from the bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The transport refused the message.
    #[error("Publish to topic '{topic}' failed: {reason}")]
    PublishFailed { topic: String, reason: String },

    /// A message arrived on a topic other than the one its payload belongs to.
    #[error("Topic mismatch: expected '{expected}', found '{actual}'")]
    TopicMismatch {
        expected: &'static str,
        actual: String,
    },

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;
