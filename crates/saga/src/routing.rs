//! Data-driven saga routing.
//!
//! The table maps the `(source, status)` of an incoming envelope to the topic
//! it must go to next. It is derived from the forward step order:
//!
//! | source         | status             | destination                         |
//! |----------------|--------------------|-------------------------------------|
//! | orchestrator   | `SUCCESS`          | first step, execute                 |
//! | orchestrator   | `FAIL`             | `finish-fail`                       |
//! | step *i*       | `SUCCESS`          | step *i+1* execute / `finish-success` |
//! | step *i*       | `ROLLBACK_PENDING` | step *i* compensate                 |
//! | step *i*       | `FAIL`             | step *i-1* compensate / `finish-fail` |

use std::collections::HashMap;

use domain::{EventSource, SagaStatus, SagaStep, Topic};

use crate::error::{Result, SagaError};
use crate::state::SagaState;

/// Where an envelope goes and the saga state that implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub destination: Topic,
    pub state: SagaState,
}

impl Route {
    fn new(destination: Topic, state: SagaState) -> Self {
        Self { destination, state }
    }
}

/// Transition table owned by the orchestrator.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    routes: HashMap<(EventSource, SagaStatus), Route>,
}

impl RoutingTable {
    /// Table for the standard order saga: product validation, payment, inventory.
    pub fn standard() -> Self {
        Self::from_steps(&SagaStep::FORWARD_ORDER)
    }

    /// Builds the table for steps executed in the given order.
    ///
    /// An empty step list routes a started saga straight to `finish-success`.
    pub fn from_steps(steps: &[SagaStep]) -> Self {
        let mut routes = HashMap::new();

        let first = steps
            .first()
            .map(|step| Route::new(step.execute_topic(), SagaState::executing(*step)))
            .unwrap_or(Route::new(Topic::FinishSuccess, SagaState::Success));
        routes.insert((EventSource::Orchestrator, SagaStatus::Success), first);
        routes.insert(
            (EventSource::Orchestrator, SagaStatus::Fail),
            Route::new(Topic::FinishFail, SagaState::Fail),
        );

        for (i, step) in steps.iter().enumerate() {
            let source = step.source();

            let forward = match steps.get(i + 1) {
                Some(next) => Route::new(next.execute_topic(), SagaState::executing(*next)),
                None => Route::new(Topic::FinishSuccess, SagaState::Success),
            };
            routes.insert((source, SagaStatus::Success), forward);

            routes.insert(
                (source, SagaStatus::RollbackPending),
                Route::new(step.compensate_topic(), SagaState::RollbackPending),
            );

            let backward = match i.checked_sub(1).and_then(|prev| steps.get(prev)) {
                Some(prev) => Route::new(prev.compensate_topic(), SagaState::RollbackPending),
                None => Route::new(Topic::FinishFail, SagaState::Fail),
            };
            routes.insert((source, SagaStatus::Fail), backward);
        }

        Self { routes }
    }

    /// Looks up the next hop for an envelope.
    pub fn route(&self, source: EventSource, status: SagaStatus) -> Result<Route> {
        self.routes
            .get(&(source, status))
            .copied()
            .ok_or(SagaError::UnknownTransition {
                origin: source,
                status,
            })
    }

    /// Number of known transitions.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::standard()
    }
}
