//! Order payload carried through the saga.

use chrono::{DateTime, Utc};
use common::{OrderId, TransactionId};
use serde::{Deserialize, Serialize};

/// Money amount represented in cents to avoid floating point issues.
///
/// Serialized as a bare integer number of cents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a new Money amount from cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Multiplies by a quantity, or `None` on overflow.
    pub fn checked_mul(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    /// Adds two amounts, or `None` on overflow.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}${}.{:02}", (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

/// A catalog product as referenced by an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product code (SKU). Empty codes are rejected by product validation.
    pub code: String,
    pub unit_value: Money,
}

impl Product {
    pub fn new(code: impl Into<String>, unit_value: Money) -> Self {
        Self {
            code: code.into(),
            unit_value,
        }
    }
}

/// One order line: a product and how many units of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProduct {
    pub product: Product,
    pub quantity: u32,
}

impl OrderProduct {
    pub fn new(product: Product, quantity: u32) -> Self {
        Self { product, quantity }
    }

    /// Returns quantity * unit value, or `None` if it does not fit.
    pub fn line_total(&self) -> Option<Money> {
        self.product.unit_value.checked_mul(self.quantity)
    }
}

/// The business payload of a saga.
///
/// `total_amount` and `total_items` start at zero and are filled in by the
/// payment step; later steps rely on them, so they must never be cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub products: Vec<OrderProduct>,
    pub created_at: DateTime<Utc>,
    pub transaction_id: TransactionId,
    #[serde(default)]
    pub total_amount: Money,
    #[serde(default)]
    pub total_items: u32,
}

impl Order {
    /// Creates an order with a fresh ID and transaction ID.
    pub fn new(products: Vec<OrderProduct>) -> Self {
        Self {
            id: OrderId::new(),
            products,
            created_at: Utc::now(),
            transaction_id: TransactionId::generate(),
            total_amount: Money::zero(),
            total_items: 0,
        }
    }

    /// Sum of all line totals.
    ///
    /// Line values come off the wire; `None` means the total overflows.
    pub fn calculate_amount(&self) -> Option<Money> {
        self.products
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line.line_total()?))
    }

    /// Sum of all line quantities, or `None` on overflow.
    pub fn calculate_items(&self) -> Option<u32> {
        self.products
            .iter()
            .try_fold(0u32, |acc, line| acc.checked_add(line.quantity))
    }
}
