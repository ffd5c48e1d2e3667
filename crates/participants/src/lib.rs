//! Saga participants.
//!
//! Each participant owns one business capability and its local state. A
//! [`ParticipantHandler`] consumes the participant's `*-success` (execute) and
//! `*-fail` (compensate) topics and always answers on `base-orchestrator`.
//!
//! - [`ProductValidationParticipant`]: checks the order's products exist
//! - [`PaymentParticipant`]: charges the order total and refunds it
//! - [`InventoryParticipant`]: reserves stock and restores it

pub mod error;
pub mod handler;
pub mod participant;
pub mod postgres;
pub mod repository;
pub mod services;
pub mod stock;

pub use error::{ParticipantError, Result};
pub use handler::ParticipantHandler;
pub use participant::{CompensationOutcome, Participant};
pub use postgres::{PostgresProductCatalog, PostgresRepository, PostgresStockLedger, run_migrations};
pub use repository::{InMemoryRepository, Repository, SagaEntity};
pub use services::{
    InventoryParticipant, InventoryReservation, MIN_AMOUNT, Payment, PaymentParticipant,
    PaymentStatus, ProductValidation, ProductValidationParticipant, ReservationStatus,
};
pub use stock::{
    InMemoryProductCatalog, InMemoryStockLedger, ProductCatalog, StockLedger, StockMovement,
};
