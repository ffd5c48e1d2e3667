//! Central saga orchestrator.

use std::sync::Arc;

use domain::{DomainError, Envelope, EventSource, SagaStatus, Topic};
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use transport::{Message, MessageBroker, Producer};

use crate::error::{Result, SagaError};
use crate::routing::{Route, RoutingTable};

/// Topics the orchestrator consumes.
pub const ORCHESTRATOR_TOPICS: [Topic; 4] = [
    Topic::StartSaga,
    Topic::BaseOrchestrator,
    Topic::FinishSuccess,
    Topic::FinishFail,
];

/// Decides every saga's next hop and stamps its final outcome.
///
/// The orchestrator holds no per-saga state; everything it needs travels in
/// the envelope.
pub struct Orchestrator<B: MessageBroker> {
    producer: Producer<B>,
    routes: RoutingTable,
}

impl<B: MessageBroker + 'static> Orchestrator<B> {
    /// Creates an orchestrator with the standard routing table.
    pub fn new(producer: Producer<B>) -> Self {
        Self::with_routes(producer, RoutingTable::standard())
    }

    pub fn with_routes(producer: Producer<B>, routes: RoutingTable) -> Self {
        Self { producer, routes }
    }

    /// Starts a saga and sends it to the first step.
    #[tracing::instrument(
        skip(self, envelope),
        fields(order_id = %envelope.order_id, transaction_id = %envelope.transaction_id)
    )]
    pub async fn start_saga(&self, mut envelope: Envelope) -> Result<Envelope> {
        metrics::counter!("saga_started_total").increment(1);
        envelope.record(EventSource::Orchestrator, SagaStatus::Success, "Saga started!");
        tracing::info!("saga started");

        self.forward(envelope).await
    }

    /// Routes a participant result to its next hop.
    #[tracing::instrument(
        skip(self, envelope),
        fields(
            order_id = %envelope.order_id,
            transaction_id = %envelope.transaction_id,
            source = %envelope.source,
            status = %envelope.status
        )
    )]
    pub async fn continue_saga(&self, envelope: Envelope) -> Result<Envelope> {
        self.forward(envelope).await
    }

    /// Stamps a successful outcome and notifies the saga ending.
    #[tracing::instrument(
        skip(self, envelope),
        fields(order_id = %envelope.order_id, transaction_id = %envelope.transaction_id)
    )]
    pub async fn finish_saga_success(&self, mut envelope: Envelope) -> Result<Envelope> {
        envelope.record(
            EventSource::Orchestrator,
            SagaStatus::Success,
            "Saga finished successfully!",
        );
        metrics::counter!("saga_completed_total").increment(1);
        tracing::info!("saga finished successfully");

        self.notify_ending(envelope).await
    }

    /// Stamps a failed outcome and notifies the saga ending.
    #[tracing::instrument(
        skip(self, envelope),
        fields(order_id = %envelope.order_id, transaction_id = %envelope.transaction_id)
    )]
    pub async fn finish_saga_fail(&self, mut envelope: Envelope) -> Result<Envelope> {
        envelope.record(
            EventSource::Orchestrator,
            SagaStatus::Fail,
            "Saga finished with errors!",
        );
        metrics::counter!("saga_failed_total").increment(1);
        tracing::warn!("saga finished with errors");

        self.notify_ending(envelope).await
    }

    /// Decodes and dispatches a raw message by topic.
    ///
    /// Contract breaches are logged and counted before being returned.
    pub async fn handle(&self, message: &Message) -> Result<Envelope> {
        let result = self.dispatch(message).await;
        if let Err(e) = &result
            && e.is_protocol_violation()
        {
            metrics::counter!("saga_protocol_violations_total", "topic" => message.topic.clone())
                .increment(1);
            tracing::error!(
                topic = %message.topic,
                message_id = %message.id,
                error = %e,
                "protocol violation"
            );
        }
        result
    }

    /// Subscribes to the orchestrator topics and processes messages in the
    /// background, one task per message.
    ///
    /// Subscriptions are in place when this returns.
    pub async fn listen(self: Arc<Self>) -> Result<JoinHandle<()>> {
        let broker = self.producer.broker();
        let mut streams = Vec::with_capacity(ORCHESTRATOR_TOPICS.len());
        for topic in ORCHESTRATOR_TOPICS {
            streams.push(broker.subscribe(topic.as_str()).await?);
        }
        let mut messages = futures_util::stream::select_all(streams);

        tracing::info!("orchestrator listening");

        Ok(tokio::spawn(async move {
            while let Some(message) = messages.next().await {
                let orchestrator = Arc::clone(&self);
                tokio::spawn(async move {
                    if let Err(e) = orchestrator.handle(&message).await
                        && !e.is_protocol_violation()
                    {
                        tracing::error!(
                            topic = %message.topic,
                            message_id = %message.id,
                            error = %e,
                            "orchestrator failed to process message"
                        );
                    }
                });
            }
        }))
    }

    async fn dispatch(&self, message: &Message) -> Result<Envelope> {
        let topic: Topic = message
            .topic
            .parse()
            .map_err(|e: DomainError| SagaError::ProtocolViolation(e.to_string()))?;
        let envelope = Envelope::from_json(&message.payload)
            .map_err(|e| SagaError::ProtocolViolation(e.to_string()))?;

        match topic {
            Topic::StartSaga => self.start_saga(envelope).await,
            Topic::BaseOrchestrator => self.continue_saga(envelope).await,
            Topic::FinishSuccess => self.finish_saga_success(envelope).await,
            Topic::FinishFail => self.finish_saga_fail(envelope).await,
            other => Err(SagaError::UnexpectedTopic(other)),
        }
    }

    async fn forward(&self, envelope: Envelope) -> Result<Envelope> {
        let Route { destination, state } = self.routes.route(envelope.source, envelope.status)?;
        metrics::counter!("saga_transitions_total", "state" => state.as_str()).increment(1);
        if state.is_terminal() {
            tracing::info!(%destination, %state, "all steps settled, finishing saga");
        } else {
            tracing::info!(
                source = %envelope.source,
                status = %envelope.status,
                %destination,
                %state,
                "routing saga"
            );
        }

        self.producer
            .send_event(destination.as_str(), &envelope)
            .await?;
        Ok(envelope)
    }

    async fn notify_ending(&self, envelope: Envelope) -> Result<Envelope> {
        self.producer
            .send_event(Topic::NotifyEnding.as_str(), &envelope)
            .await?;
        Ok(envelope)
    }
}
