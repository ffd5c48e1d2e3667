//! Shared saga vocabulary.
//!
//! This crate provides the contract every saga component speaks:
//! - `Envelope` and its append-only `History`
//! - `SagaStatus` and `EventSource`
//! - the topic directory (`Topic`, `SagaStep`)
//! - the order payload (`Order`, `OrderProduct`, `Product`, `Money`)

pub mod envelope;
pub mod error;
pub mod order;
pub mod status;
pub mod topic;

pub use common::{OrderId, SagaKey, TransactionId};
pub use envelope::{Envelope, History};
pub use error::DomainError;
pub use order::{Money, Order, OrderProduct, Product};
pub use status::{EventSource, SagaStatus};
pub use topic::{SagaStep, Topic};
