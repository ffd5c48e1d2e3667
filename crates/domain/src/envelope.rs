//! The saga envelope: the message every component consumes and republishes.

use chrono::{DateTime, Utc};
use common::{OrderId, SagaKey, TransactionId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::order::Order;
use crate::status::{EventSource, SagaStatus};

/// One audit record in an envelope's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub source: EventSource,
    pub status: SagaStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Saga identity, business payload, current status and audit trail.
///
/// The history is append-only: it can be read through [`Envelope::history`]
/// and extended through [`Envelope::add_to_history`] or [`Envelope::record`],
/// but never edited or truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub order_id: OrderId,
    pub transaction_id: TransactionId,
    pub payload: Order,
    pub source: EventSource,
    pub status: SagaStatus,
    #[serde(rename = "eventHistory", default)]
    history: Vec<History>,
    pub created_at: DateTime<Utc>,
}

impl Envelope {
    /// Creates the initial envelope for an order, as published by a trigger.
    pub fn new(order: Order, source: EventSource) -> Self {
        Self {
            order_id: order.id,
            transaction_id: order.transaction_id.clone(),
            payload: order,
            source,
            status: SagaStatus::Success,
            history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Returns the idempotency key of this saga instance.
    pub fn key(&self) -> SagaKey {
        SagaKey::new(self.order_id, self.transaction_id.clone())
    }

    /// Returns the audit trail, oldest entry first.
    pub fn history(&self) -> &[History] {
        &self.history
    }

    /// Returns the most recent history entry.
    pub fn last_history(&self) -> Option<&History> {
        self.history.last()
    }

    /// Appends an entry stamped with the current source and status.
    pub fn add_to_history(&mut self, message: impl Into<String>) {
        self.history.push(History {
            source: self.source,
            status: self.status,
            message: message.into(),
            created_at: Utc::now(),
        });
    }

    /// Sets source and status, then appends an entry describing the outcome.
    pub fn record(&mut self, source: EventSource, status: SagaStatus, message: impl Into<String>) {
        self.source = source;
        self.status = status;
        self.add_to_history(message);
    }

    /// Serializes the envelope for the wire.
    pub fn to_json(&self) -> Result<String, DomainError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses an envelope from the wire.
    ///
    /// Unknown status or source values are rejected, not defaulted.
    pub fn from_json(payload: &str) -> Result<Self, DomainError> {
        serde_json::from_str(payload).map_err(DomainError::MalformedEnvelope)
    }
}
