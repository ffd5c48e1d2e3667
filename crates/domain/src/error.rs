//! Domain error types.

use thiserror::Error;

/// Errors raised by the shared saga vocabulary.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A payload could not be parsed as an envelope, including envelopes
    /// carrying a status or source outside the known vocabulary.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(serde_json::Error),

    /// A topic name is not part of the directory.
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
