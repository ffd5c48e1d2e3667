//! The contract every saga participant implements.

use async_trait::async_trait;
use domain::{Envelope, SagaStep};

use crate::error::Result;

/// What a compensation actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompensationOutcome {
    /// Local state was moved to its compensated form.
    Done,
    /// There was nothing to undo for this key (never executed, or already undone).
    NothingToDo,
    /// Undoing failed; the saga keeps unwinding regardless.
    Failed(String),
}

impl CompensationOutcome {
    /// History message describing this outcome for a step.
    pub fn describe(&self, step: SagaStep) -> String {
        match self {
            CompensationOutcome::Done => format!("Rollback executed for {step}"),
            CompensationOutcome::NothingToDo => format!("Nothing to compensate for {step}"),
            CompensationOutcome::Failed(reason) => {
                format!("Rollback not executed for {step}: {reason}")
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompensationOutcome::Done => "done",
            CompensationOutcome::NothingToDo => "nothing_to_do",
            CompensationOutcome::Failed(_) => "failed",
        }
    }
}

/// Business logic of one saga step.
///
/// Implementations only decide and persist; status, history and publishing
/// are handled by [`crate::ParticipantHandler`].
#[async_trait]
pub trait Participant: Send + Sync {
    /// The step this participant performs.
    fn step(&self) -> SagaStep;

    /// History message for a successful forward action.
    fn success_message(&self) -> &'static str;

    /// History message prefix for a failed forward action.
    fn failure_message(&self) -> &'static str;

    /// Runs the forward action for the envelope's key.
    ///
    /// May enrich the payload. On error no forward state change may remain.
    async fn execute(&self, envelope: &mut Envelope) -> Result<()>;

    /// Undoes the forward action for the envelope's key.
    ///
    /// Must succeed with [`CompensationOutcome::NothingToDo`] when `execute`
    /// never ran for the key. Errors are recorded, never propagated.
    async fn compensate(&self, envelope: &mut Envelope) -> Result<CompensationOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_outcomes() {
        assert_eq!(
            CompensationOutcome::Done.describe(SagaStep::Payment),
            "Rollback executed for payment"
        );
        assert_eq!(
            CompensationOutcome::NothingToDo.describe(SagaStep::ProductValidation),
            "Nothing to compensate for product validation"
        );
        assert_eq!(
            CompensationOutcome::Failed("db down".into()).describe(SagaStep::Inventory),
            "Rollback not executed for inventory: db down"
        );
    }
}
