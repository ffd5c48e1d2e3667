//! Inventory participant.

use async_trait::async_trait;
use common::SagaKey;
use domain::{Envelope, SagaStep};
use serde::{Deserialize, Serialize};

use crate::error::{ParticipantError, Result};
use crate::participant::{CompensationOutcome, Participant};
use crate::repository::{Repository, SagaEntity};
use crate::stock::{StockLedger, StockMovement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    /// Key claimed, stock not taken yet.
    Pending,
    Reserved,
    Restored,
}

/// Stock taken for one saga, one movement per order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReservation {
    pub key: SagaKey,
    pub items: Vec<StockMovement>,
    pub status: ReservationStatus,
}

impl SagaEntity for InventoryReservation {
    const KIND: &'static str = "inventory_reservation";

    fn key(&self) -> &SagaKey {
        &self.key
    }
}

/// Reserves stock for every order line and gives it back on rollback.
pub struct InventoryParticipant<R, S>
where
    R: Repository<InventoryReservation>,
    S: StockLedger,
{
    repository: R,
    stock: S,
}

impl<R, S> InventoryParticipant<R, S>
where
    R: Repository<InventoryReservation>,
    S: StockLedger,
{
    pub fn new(repository: R, stock: S) -> Self {
        Self { repository, stock }
    }

    /// Undoes a forward attempt: gives back what was taken and drops the claim.
    async fn abort(&self, key: &SagaKey, movements: &[StockMovement]) {
        for movement in movements {
            if let Err(e) = self
                .stock
                .release(&movement.product_code, movement.order_quantity)
                .await
            {
                tracing::error!(
                    %key,
                    product_code = %movement.product_code,
                    quantity = movement.order_quantity,
                    error = %e,
                    "failed to release stock after aborted reservation"
                );
            }
        }
        if let Err(e) = self.repository.remove(key).await {
            tracing::error!(%key, error = %e, "failed to drop reservation claim");
        }
    }
}

#[async_trait]
impl<R, S> Participant for InventoryParticipant<R, S>
where
    R: Repository<InventoryReservation>,
    S: StockLedger,
{
    fn step(&self) -> SagaStep {
        SagaStep::Inventory
    }

    fn success_message(&self) -> &'static str {
        "Inventory updated successfully!"
    }

    fn failure_message(&self) -> &'static str {
        "Fail to update inventory"
    }

    async fn execute(&self, envelope: &mut Envelope) -> Result<()> {
        let key = envelope.key();
        let mut reservation = self
            .repository
            .insert(InventoryReservation {
                key: key.clone(),
                items: Vec::new(),
                status: ReservationStatus::Pending,
            })
            .await?;

        let mut movements = Vec::with_capacity(envelope.payload.products.len());
        for line in &envelope.payload.products {
            match self.stock.reserve(&line.product.code, line.quantity).await {
                Ok(movement) => movements.push(movement),
                Err(e) => {
                    self.abort(&key, &movements).await;
                    return Err(e);
                }
            }
        }

        reservation.items = movements;
        reservation.status = ReservationStatus::Reserved;
        if let Err(e) = self.repository.save(reservation.clone()).await {
            self.abort(&key, &reservation.items).await;
            return Err(e);
        }
        Ok(())
    }

    async fn compensate(&self, envelope: &mut Envelope) -> Result<CompensationOutcome> {
        let key = envelope.key();
        let Some(mut reservation) = self.repository.find_by_key(&key).await? else {
            return Ok(CompensationOutcome::NothingToDo);
        };
        if reservation.status != ReservationStatus::Reserved {
            return Ok(CompensationOutcome::NothingToDo);
        }

        for item in &reservation.items {
            self.stock
                .release(&item.product_code, item.order_quantity)
                .await?;
        }
        reservation.status = ReservationStatus::Restored;
        self.repository.save(reservation).await?;
        Ok(CompensationOutcome::Done)
    }
}
