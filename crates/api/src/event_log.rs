//! Record of finished sagas, fed by `notify-ending`.

use std::collections::VecDeque;
use std::sync::Arc;

use common::{OrderId, TransactionId};
use domain::{Envelope, Topic};
use futures_util::StreamExt;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use transport::{MessageBroker, TransportError};

/// Endings kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Final envelopes in arrival order, bounded.
///
/// Once full, the oldest ending is evicted for each new one.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Arc<RwLock<VecDeque<Envelope>>>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a log holding at most `capacity` endings (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Arc::default(),
            capacity: capacity.max(1),
        }
    }

    pub async fn record(&self, envelope: Envelope) {
        let mut events = self.events.write().await;
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(envelope);
    }

    /// Returns the most recent envelope matching every given filter.
    pub async fn find(
        &self,
        order_id: Option<OrderId>,
        transaction_id: Option<&TransactionId>,
    ) -> Option<Envelope> {
        self.events
            .read()
            .await
            .iter()
            .rev()
            .find(|e| {
                order_id.is_none_or(|id| e.order_id == id)
                    && transaction_id.is_none_or(|tx| &e.transaction_id == tx)
            })
            .cloned()
    }

    /// Returns every recorded envelope, newest first.
    pub async fn all(&self) -> Vec<Envelope> {
        self.events.read().await.iter().rev().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    /// Records every envelope published to `notify-ending`.
    pub async fn listen<B: MessageBroker>(
        &self,
        broker: &B,
    ) -> Result<JoinHandle<()>, TransportError> {
        let mut messages = broker.subscribe(Topic::NotifyEnding.as_str()).await?;
        let log = self.clone();

        Ok(tokio::spawn(async move {
            while let Some(message) = messages.next().await {
                match Envelope::from_json(&message.payload) {
                    Ok(envelope) => {
                        tracing::info!(
                            order_id = %envelope.order_id,
                            transaction_id = %envelope.transaction_id,
                            status = %envelope.status,
                            "saga ended"
                        );
                        log.record(envelope).await;
                    }
                    Err(e) => {
                        tracing::error!(
                            message_id = %message.id,
                            error = %e,
                            "unreadable saga ending"
                        );
                    }
                }
            }
        }))
    }
}
