//! Shared publish capability used by every saga component.

use serde::Serialize;

use crate::{MessageBroker, MessageId, Result};

/// Serializes events and publishes them to a named destination.
///
/// Failures are logged and counted here so callers only need to decide
/// what a lost publish means for them. Nothing is retried.
#[derive(Clone)]
pub struct Producer<B: MessageBroker> {
    broker: B,
}

impl<B: MessageBroker> Producer<B> {
    /// Creates a producer over the given broker.
    pub fn new(broker: B) -> Self {
        Self { broker }
    }

    /// Returns the underlying broker.
    pub fn broker(&self) -> &B {
        &self.broker
    }

    /// Publishes `event` as JSON to `topic`.
    pub async fn send_event<T: Serialize + ?Sized>(
        &self,
        topic: &str,
        event: &T,
    ) -> Result<MessageId> {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                metrics::counter!("transport_publish_failures_total", "topic" => topic.to_string())
                    .increment(1);
                tracing::error!(%topic, error = %e, "failed to serialize event");
                return Err(e.into());
            }
        };

        tracing::info!(%topic, "sending event");
        tracing::debug!(%topic, %payload, "event payload");

        match self.broker.publish(topic, payload).await {
            Ok(id) => {
                metrics::counter!("transport_messages_published_total", "topic" => topic.to_string())
                    .increment(1);
                Ok(id)
            }
            Err(e) => {
                metrics::counter!("transport_publish_failures_total", "topic" => topic.to_string())
                    .increment(1);
                tracing::error!(%topic, error = %e, "failed to send event");
                Err(e)
            }
        }
    }
}
