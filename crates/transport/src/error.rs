use thiserror::Error;

/// Errors that can occur when talking to the message transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The topic name is not acceptable to the transport.
    #[error("Invalid topic name: {0:?}")]
    InvalidTopic(String),

    /// The transport rejected or could not deliver a message.
    #[error("Publish to topic {topic} failed: {reason}")]
    Publish { topic: String, reason: String },

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
