use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a published message.
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

/// A message as it travels through the transport.
///
/// The payload is the serialized body; the transport never looks inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this delivery.
    pub id: MessageId,

    /// Destination the message was published to.
    pub topic: String,

    /// Serialized body.
    pub payload: String,

    /// When the message was published.
    pub published_at: DateTime<Utc>,
}

impl Message {
    /// Creates a message for the given topic, stamped now.
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            topic: topic.into(),
            payload: payload.into(),
            published_at: Utc::now(),
        }
    }

    /// Deserializes the payload as JSON.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}
