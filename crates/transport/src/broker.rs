use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{Message, MessageId, Result, TransportError};

/// A stream of messages delivered to one subscription.
pub type MessageStream = Pin<Box<dyn Stream<Item = Message> + Send>>;

/// Core trait for message transports.
///
/// Delivery is at-least-once: consumers must tolerate duplicates.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publishes a serialized payload to a topic.
    ///
    /// Returns the ID assigned to the message.
    async fn publish(&self, topic: &str, payload: String) -> Result<MessageId>;

    /// Subscribes to a topic.
    ///
    /// The stream yields every message published to the topic after the
    /// subscription was created, in publish order.
    async fn subscribe(&self, topic: &str) -> Result<MessageStream>;
}

/// Validates a topic name before publishing or subscribing.
///
/// Names must be non-empty and contain only ASCII alphanumerics, `-`, `_` or `.`.
pub fn validate_topic(topic: &str) -> Result<()> {
    let valid = !topic.is_empty()
        && topic
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(TransportError::InvalidTopic(topic.to_string()))
    }
}
