//! Business capabilities that take part in the order saga.

pub mod inventory;
pub mod payment;
pub mod product_validation;

pub use inventory::{InventoryParticipant, InventoryReservation, ReservationStatus};
pub use payment::{MIN_AMOUNT, Payment, PaymentParticipant, PaymentStatus};
pub use product_validation::{ProductValidation, ProductValidationParticipant};
