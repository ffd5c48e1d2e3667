use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};

use crate::{
    Message, MessageId, Result, TransportError,
    broker::{MessageBroker, MessageStream, validate_topic},
};

/// In-memory message broker for tests and single-process deployments.
///
/// Every subscriber of a topic receives every message published to it
/// after it subscribed (fan-out). A broker built with [`InMemoryBroker::with_log`]
/// also keeps every published message so tests can inspect what went where.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    subscribers: Arc<RwLock<HashMap<String, Vec<mpsc::UnboundedSender<Message>>>>>,
    published: Option<Arc<RwLock<Vec<Message>>>>,
    fail_on_publish: Arc<AtomicBool>,
}

impl InMemoryBroker {
    /// Creates a new broker with no subscriptions and no published log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a broker that records every published message.
    pub fn with_log() -> Self {
        Self {
            published: Some(Arc::default()),
            ..Self::default()
        }
    }

    /// Makes every subsequent publish fail until reset.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.fail_on_publish.store(fail, Ordering::SeqCst);
    }

    /// Returns the total number of messages published. Always zero without a log.
    pub async fn published_count(&self) -> usize {
        match &self.published {
            Some(log) => log.read().await.len(),
            None => 0,
        }
    }

    /// Returns the messages published to a topic, oldest first.
    pub async fn published_to(&self, topic: &str) -> Vec<Message> {
        let Some(log) = &self.published else {
            return Vec::new();
        };
        log.read()
            .await
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Returns the number of live subscriptions for a topic.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers
            .read()
            .await
            .get(topic)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn publish(&self, topic: &str, payload: String) -> Result<MessageId> {
        validate_topic(topic)?;

        if self.fail_on_publish.load(Ordering::SeqCst) {
            return Err(TransportError::Publish {
                topic: topic.to_string(),
                reason: "broker unavailable".to_string(),
            });
        }

        let message = Message::new(topic, payload);
        let id = message.id;

        if let Some(log) = &self.published {
            log.write().await.push(message.clone());
        }

        let mut subscribers = self.subscribers.write().await;
        if let Some(subs) = subscribers.get_mut(topic) {
            // Dropped receivers are pruned here
            subs.retain(|tx| tx.send(message.clone()).is_ok());
        }

        tracing::trace!(%topic, message_id = %id, "message published");
        Ok(id)
    }

    async fn subscribe(&self, topic: &str) -> Result<MessageStream> {
        validate_topic(topic)?;

        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .write()
            .await
            .entry(topic.to_string())
            .or_default()
            .push(tx);

        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|message| (message, rx))
        });
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn subscriber_receives_published_message() {
        let broker = InMemoryBroker::with_log();
        let mut stream = broker.subscribe("payment-success").await.unwrap();

        let id = broker
            .publish("payment-success", "hello".to_string())
            .await
            .unwrap();

        let message = stream.next().await.unwrap();
        assert_eq!(message.id, id);
        assert_eq!(message.topic, "payment-success");
        assert_eq!(message.payload, "hello");
    }

    #[tokio::test]
    async fn every_subscriber_gets_a_copy() {
        let broker = InMemoryBroker::with_log();
        let mut first = broker.subscribe("finish-fail").await.unwrap();
        let mut second = broker.subscribe("finish-fail").await.unwrap();

        broker.publish("finish-fail", "x".to_string()).await.unwrap();

        assert_eq!(first.next().await.unwrap().payload, "x");
        assert_eq!(second.next().await.unwrap().payload, "x");
        assert_eq!(broker.subscriber_count("finish-fail").await, 2);
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let broker = InMemoryBroker::with_log();
        let mut stream = broker.subscribe("inventory-fail").await.unwrap();

        broker
            .publish("inventory-success", "a".to_string())
            .await
            .unwrap();
        broker
            .publish("inventory-fail", "b".to_string())
            .await
            .unwrap();

        assert_eq!(stream.next().await.unwrap().payload, "b");
        assert_eq!(broker.published_to("inventory-success").await.len(), 1);
        assert_eq!(broker.published_count().await, 2);
    }

    #[tokio::test]
    async fn preserves_publish_order() {
        let broker = InMemoryBroker::with_log();
        let mut stream = broker.subscribe("base-orchestrator").await.unwrap();

        for i in 0..5 {
            broker
                .publish("base-orchestrator", i.to_string())
                .await
                .unwrap();
        }

        for i in 0..5 {
            assert_eq!(stream.next().await.unwrap().payload, i.to_string());
        }
    }

    #[tokio::test]
    async fn dropped_subscription_is_pruned() {
        let broker = InMemoryBroker::with_log();
        let stream = broker.subscribe("notify-ending").await.unwrap();
        drop(stream);

        broker
            .publish("notify-ending", "x".to_string())
            .await
            .unwrap();
        assert_eq!(broker.subscriber_count("notify-ending").await, 0);
    }

    #[tokio::test]
    async fn default_broker_keeps_no_log() {
        let broker = InMemoryBroker::new();
        let mut stream = broker.subscribe("notify-ending").await.unwrap();

        broker
            .publish("notify-ending", "x".to_string())
            .await
            .unwrap();

        assert_eq!(stream.next().await.unwrap().payload, "x");
        assert_eq!(broker.published_count().await, 0);
        assert!(broker.published_to("notify-ending").await.is_empty());
    }

    #[tokio::test]
    async fn fail_on_publish() {
        let broker = InMemoryBroker::with_log();
        broker.set_fail_on_publish(true);

        let result = broker.publish("start-saga", "x".to_string()).await;
        assert!(matches!(result, Err(TransportError::Publish { .. })));
        assert_eq!(broker.published_count().await, 0);

        broker.set_fail_on_publish(false);
        assert!(broker.publish("start-saga", "x".to_string()).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_invalid_topic() {
        let broker = InMemoryBroker::with_log();
        assert!(matches!(
            broker.publish("", "x".to_string()).await,
            Err(TransportError::InvalidTopic(_))
        ));
        assert!(broker.subscribe("bad topic").await.is_err());
    }
}
