//! Participant error types.

use common::SagaKey;
use domain::{DomainError, Topic};
use thiserror::Error;
use transport::TransportError;

/// Reasons a participant operation did not go through.
///
/// Business failures (duplicate, validation, not found) are turned into a
/// `ROLLBACK_PENDING` envelope by the handler; they never crash a consumer.
#[derive(Debug, Error)]
pub enum ParticipantError {
    /// The key was already processed by this participant.
    #[error("There is another transactionId for this validation ({0})")]
    DuplicateTransaction(SagaKey),

    /// Local business validation rejected the request.
    #[error("{0}")]
    Validation(String),

    /// Something the request refers to does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A storage adapter failed without a more specific cause.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A message arrived on a topic this participant does not own.
    #[error("Topic {0} is not handled by this participant")]
    UnexpectedTopic(Topic),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Envelope or topic could not be understood.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Transport error.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for participant results.
pub type Result<T> = std::result::Result<T, ParticipantError>;
