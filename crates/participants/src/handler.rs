//! Wraps a [`Participant`] with the status/history/publish contract.

use std::sync::Arc;

use domain::{Envelope, SagaStatus, Topic};
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use transport::{Message, MessageBroker, Producer};

use crate::error::{ParticipantError, Result};
use crate::participant::{CompensationOutcome, Participant};

/// Drives one participant: consumes its inbox topics, runs the forward or
/// compensating action and always replies on `base-orchestrator`.
pub struct ParticipantHandler<P, B>
where
    P: Participant,
    B: MessageBroker,
{
    participant: P,
    producer: Producer<B>,
}

impl<P, B> ParticipantHandler<P, B>
where
    P: Participant + 'static,
    B: MessageBroker + 'static,
{
    pub fn new(participant: P, producer: Producer<B>) -> Self {
        Self {
            participant,
            producer,
        }
    }

    pub fn participant(&self) -> &P {
        &self.participant
    }

    /// Runs the forward action and publishes the result.
    ///
    /// Business failures become a `ROLLBACK_PENDING` envelope.
    #[tracing::instrument(
        skip(self, envelope),
        fields(
            step = %self.participant.step(),
            order_id = %envelope.order_id,
            transaction_id = %envelope.transaction_id
        )
    )]
    pub async fn execute(&self, mut envelope: Envelope) -> Envelope {
        let step = self.participant.step();
        metrics::counter!("participant_executions_total", "step" => step.name()).increment(1);

        match self.participant.execute(&mut envelope).await {
            Ok(()) => {
                envelope.record(
                    step.source(),
                    SagaStatus::Success,
                    self.participant.success_message(),
                );
                tracing::info!("step executed");
            }
            Err(e) => {
                metrics::counter!("participant_failures_total", "step" => step.name())
                    .increment(1);
                tracing::warn!(error = %e, "step failed, requesting rollback");
                envelope.record(
                    step.source(),
                    SagaStatus::RollbackPending,
                    format!("{}: {}", self.participant.failure_message(), e),
                );
            }
        }

        self.publish_result(&envelope).await;
        envelope
    }

    /// Runs the compensating action and publishes the result.
    ///
    /// Never fails: the outcome, including a failed rollback, is recorded in
    /// the history and the envelope always leaves with status `FAIL`.
    #[tracing::instrument(
        skip(self, envelope),
        fields(
            step = %self.participant.step(),
            order_id = %envelope.order_id,
            transaction_id = %envelope.transaction_id
        )
    )]
    pub async fn compensate(&self, mut envelope: Envelope) -> Envelope {
        let step = self.participant.step();
        envelope.source = step.source();
        envelope.status = SagaStatus::Fail;

        let outcome = match self.participant.compensate(&mut envelope).await {
            Ok(outcome) => outcome,
            Err(e) => CompensationOutcome::Failed(e.to_string()),
        };

        metrics::counter!(
            "participant_compensations_total",
            "step" => step.name(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        match &outcome {
            CompensationOutcome::Failed(reason) => {
                tracing::error!(%reason, "compensation failed, saga keeps unwinding")
            }
            _ => tracing::info!(outcome = outcome.as_str(), "compensation finished"),
        }

        envelope.add_to_history(outcome.describe(step));
        self.publish_result(&envelope).await;
        envelope
    }

    /// Dispatches a raw message by topic.
    pub async fn handle(&self, message: &Message) -> Result<Envelope> {
        let topic: Topic = message.topic.parse()?;
        let envelope = Envelope::from_json(&message.payload)?;
        let step = self.participant.step();

        if topic == step.execute_topic() {
            Ok(self.execute(envelope).await)
        } else if topic == step.compensate_topic() {
            Ok(self.compensate(envelope).await)
        } else {
            Err(ParticipantError::UnexpectedTopic(topic))
        }
    }

    /// Subscribes to the participant's inbox topics and processes messages
    /// in the background, one task per message.
    ///
    /// Subscriptions are in place when this returns.
    pub async fn listen(self: Arc<Self>) -> Result<JoinHandle<()>> {
        let step = self.participant.step();
        let broker = self.producer.broker();
        let execute = broker.subscribe(step.execute_topic().as_str()).await?;
        let compensate = broker.subscribe(step.compensate_topic().as_str()).await?;
        let mut messages = futures_util::stream::select(execute, compensate);

        tracing::info!(%step, "participant listening");

        Ok(tokio::spawn(async move {
            while let Some(message) = messages.next().await {
                let handler = Arc::clone(&self);
                tokio::spawn(async move {
                    if let Err(e) = handler.handle(&message).await {
                        tracing::error!(
                            topic = %message.topic,
                            message_id = %message.id,
                            error = %e,
                            "message rejected by participant"
                        );
                    }
                });
            }
        }))
    }

    async fn publish_result(&self, envelope: &Envelope) {
        let topic = Topic::BaseOrchestrator;
        if let Err(e) = self.producer.send_event(topic.as_str(), envelope).await {
            // Local state is already committed; the saga stalls until redelivery.
            tracing::error!(
                key = %envelope.key(),
                status = %envelope.status,
                %topic,
                error = %e,
                "result not published, local state and saga are out of sync"
            );
        }
    }
}
