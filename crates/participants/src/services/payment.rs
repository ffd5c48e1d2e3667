//! Payment participant.

use async_trait::async_trait;
use common::SagaKey;
use domain::{Envelope, Money, SagaStep};
use serde::{Deserialize, Serialize};

use crate::error::{ParticipantError, Result};
use crate::participant::{CompensationOutcome, Participant};
use crate::repository::{Repository, SagaEntity};

/// Smallest amount the payment step accepts.
pub const MIN_AMOUNT: Money = Money::from_cents(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Success,
    Refund,
}

/// A charge for one saga.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub key: SagaKey,
    pub total_amount: Money,
    pub total_items: u32,
    pub status: PaymentStatus,
}

impl SagaEntity for Payment {
    const KIND: &'static str = "payment";

    fn key(&self) -> &SagaKey {
        &self.key
    }
}

/// Charges the order total and refunds it on rollback.
pub struct PaymentParticipant<R: Repository<Payment>> {
    repository: R,
}

impl<R: Repository<Payment>> PaymentParticipant<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

fn set_payload_totals(envelope: &mut Envelope, payment: &Payment) {
    envelope.payload.total_amount = payment.total_amount;
    envelope.payload.total_items = payment.total_items;
}

#[async_trait]
impl<R: Repository<Payment>> Participant for PaymentParticipant<R> {
    fn step(&self) -> SagaStep {
        SagaStep::Payment
    }

    fn success_message(&self) -> &'static str {
        "Payment realized successfully!"
    }

    fn failure_message(&self) -> &'static str {
        "Fail to realize payment"
    }

    async fn execute(&self, envelope: &mut Envelope) -> Result<()> {
        let (Some(total_amount), Some(total_items)) = (
            envelope.payload.calculate_amount(),
            envelope.payload.calculate_items(),
        ) else {
            return Err(ParticipantError::Validation(
                "Order totals exceed the supported range".to_string(),
            ));
        };
        if total_amount < MIN_AMOUNT {
            return Err(ParticipantError::Validation(format!(
                "The minimum amount available is {MIN_AMOUNT}"
            )));
        }

        let payment = self
            .repository
            .insert(Payment {
                key: envelope.key(),
                total_amount,
                total_items,
                status: PaymentStatus::Success,
            })
            .await?;
        set_payload_totals(envelope, &payment);
        Ok(())
    }

    async fn compensate(&self, envelope: &mut Envelope) -> Result<CompensationOutcome> {
        let key = envelope.key();
        let Some(mut payment) = self.repository.find_by_key(&key).await? else {
            return Ok(CompensationOutcome::NothingToDo);
        };
        if payment.status == PaymentStatus::Refund {
            set_payload_totals(envelope, &payment);
            return Ok(CompensationOutcome::NothingToDo);
        }

        payment.status = PaymentStatus::Refund;
        let payment = self.repository.save(payment).await?;
        set_payload_totals(envelope, &payment);
        Ok(CompensationOutcome::Done)
    }
}
