//! Saga orchestration for the order flow.
//!
//! The orchestrator consumes `start-saga`, `base-orchestrator`,
//! `finish-success` and `finish-fail`. Every participant result comes back on
//! `base-orchestrator` and is routed by a [`RoutingTable`] keyed on the
//! envelope's `(source, status)`:
//! 1. Product validation
//! 2. Payment
//! 3. Inventory
//!
//! If any step fails, the failing step and then every previously completed
//! step are compensated in reverse order.

pub mod error;
pub mod orchestrator;
pub mod routing;
pub mod state;

pub use error::{Result, SagaError};
pub use orchestrator::{ORCHESTRATOR_TOPICS, Orchestrator};
pub use routing::{Route, RoutingTable};
pub use state::SagaState;
