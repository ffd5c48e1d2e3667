//! Identifiers shared by every saga component.

pub mod types;

pub use types::{OrderId, SagaKey, TransactionId};
