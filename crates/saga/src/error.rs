//! Saga error types.

use domain::{DomainError, EventSource, SagaStatus, Topic};
use thiserror::Error;
use transport::TransportError;

/// Errors that can occur while orchestrating a saga.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A message did not follow the envelope contract (unknown status or
    /// source, missing fields, invalid JSON).
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// No route exists for the envelope's source and status.
    #[error("No transition for source {origin} with status {status}")]
    UnknownTransition {
        origin: EventSource,
        status: SagaStatus,
    },

    /// A message arrived on a topic the orchestrator does not consume.
    #[error("Topic {0} is not consumed by the orchestrator")]
    UnexpectedTopic(Topic),

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Transport error.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SagaError {
    /// Returns true for errors caused by a peer breaking the protocol.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            SagaError::ProtocolViolation(_)
                | SagaError::UnknownTransition { .. }
                | SagaError::UnexpectedTopic(_)
        )
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
