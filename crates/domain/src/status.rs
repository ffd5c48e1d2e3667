//! Saga status and event source vocabularies.

use serde::{Deserialize, Serialize};

/// Outcome recorded on an envelope by the last component that touched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaStatus {
    /// The step completed its local transaction.
    Success,

    /// The step failed; its own partial work still needs undoing.
    RollbackPending,

    /// The saga is unwinding (or finished unwinding).
    Fail,
}

impl SagaStatus {
    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Success => "SUCCESS",
            SagaStatus::RollbackPending => "ROLLBACK_PENDING",
            SagaStatus::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The component that last touched an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventSource {
    Orchestrator,
    OrderService,
    ProductValidationService,
    PaymentService,
    InventoryService,
}

impl EventSource {
    /// Returns the wire name of the source.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Orchestrator => "ORCHESTRATOR",
            EventSource::OrderService => "ORDER_SERVICE",
            EventSource::ProductValidationService => "PRODUCT_VALIDATION_SERVICE",
            EventSource::PaymentService => "PAYMENT_SERVICE",
            EventSource::InventoryService => "INVENTORY_SERVICE",
        }
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        for status in [
            SagaStatus::Success,
            SagaStatus::RollbackPending,
            SagaStatus::Fail,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result: Result<SagaStatus, _> = serde_json::from_str("\"PENDING\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_source_wire_names() {
        let json = serde_json::to_string(&EventSource::ProductValidationService).unwrap();
        assert_eq!(json, "\"PRODUCT_VALIDATION_SERVICE\"");
        assert_eq!(EventSource::PaymentService.to_string(), "PAYMENT_SERVICE");
    }
}
