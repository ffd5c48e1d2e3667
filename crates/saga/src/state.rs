//! Saga state machine.

use domain::SagaStep;

/// Where a saga stands after a routing decision.
///
/// State transitions:
/// ```text
/// NotStarted ──► ProductValidation ──► PaymentValidation ──► InventoryValidation ──► Success
///                       │                     │                      │
///                       └─────────────────────┴──────────────────────┴──► RollbackPending ──► Fail
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SagaState {
    /// Saga has not been routed yet.
    #[default]
    NotStarted,

    /// Waiting for product validation.
    ProductValidation,

    /// Waiting for payment.
    PaymentValidation,

    /// Waiting for inventory.
    InventoryValidation,

    /// Every step completed (terminal state).
    Success,

    /// A step failed and compensations are in flight.
    RollbackPending,

    /// Compensation finished or the saga was aborted (terminal state).
    Fail,
}

impl SagaState {
    /// State of a saga waiting on a step's forward action.
    pub fn executing(step: SagaStep) -> Self {
        match step {
            SagaStep::ProductValidation => SagaState::ProductValidation,
            SagaStep::Payment => SagaState::PaymentValidation,
            SagaStep::Inventory => SagaState::InventoryValidation,
        }
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Success | SagaState::Fail)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::NotStarted => "NOT_STARTED",
            SagaState::ProductValidation => "PRODUCT_VALIDATION",
            SagaState::PaymentValidation => "PAYMENT_VALIDATION",
            SagaState::InventoryValidation => "INVENTORY_VALIDATION",
            SagaState::Success => "SUCCESS",
            SagaState::RollbackPending => "ROLLBACK_PENDING",
            SagaState::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
