//! Inventory stock ledger and product catalog.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{ParticipantError, Result};

pub(crate) const OUT_OF_STOCK: &str = "Product is out of stock!";

pub(crate) fn inventory_not_found(code: &str) -> ParticipantError {
    ParticipantError::NotFound(format!("Inventory not found by informed product {code}"))
}

/// The effect of one reservation on a product's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub product_code: String,
    pub old_quantity: u32,
    pub order_quantity: u32,
    pub new_quantity: u32,
}

/// Available units per product code.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Returns the available units, or `None` for an unknown product.
    async fn available(&self, product_code: &str) -> Result<Option<u32>>;

    /// Atomically takes `quantity` units.
    ///
    /// Fails with `NotFound` for unknown products and `Validation` when
    /// fewer than `quantity` units are available.
    async fn reserve(&self, product_code: &str, quantity: u32) -> Result<StockMovement>;

    /// Gives `quantity` units back.
    async fn release(&self, product_code: &str, quantity: u32) -> Result<()>;
}

/// Products that may be ordered.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn exists(&self, product_code: &str) -> Result<bool>;
}

/// In-memory stock ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockLedger {
    stock: Arc<RwLock<HashMap<String, u32>>>,
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger seeded with `(code, available)` pairs.
    pub fn with_stock<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let stock = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            stock: Arc::new(RwLock::new(stock)),
        }
    }

    /// Overwrites the available units of a product.
    pub async fn set_stock(&self, product_code: impl Into<String>, available: u32) {
        self.stock
            .write()
            .await
            .insert(product_code.into(), available);
    }
}

#[async_trait]
impl StockLedger for InMemoryStockLedger {
    async fn available(&self, product_code: &str) -> Result<Option<u32>> {
        Ok(self.stock.read().await.get(product_code).copied())
    }

    async fn reserve(&self, product_code: &str, quantity: u32) -> Result<StockMovement> {
        let mut stock = self.stock.write().await;
        let available = stock
            .get_mut(product_code)
            .ok_or_else(|| inventory_not_found(product_code))?;

        if quantity > *available {
            return Err(ParticipantError::Validation(OUT_OF_STOCK.to_string()));
        }

        let old_quantity = *available;
        *available -= quantity;
        Ok(StockMovement {
            product_code: product_code.to_string(),
            old_quantity,
            order_quantity: quantity,
            new_quantity: *available,
        })
    }

    async fn release(&self, product_code: &str, quantity: u32) -> Result<()> {
        let mut stock = self.stock.write().await;
        let available = stock
            .get_mut(product_code)
            .ok_or_else(|| inventory_not_found(product_code))?;
        *available = available.saturating_add(quantity);
        Ok(())
    }
}

/// In-memory product catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductCatalog {
    codes: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the given product codes.
    pub fn with_products<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: Arc::new(RwLock::new(codes.into_iter().map(Into::into).collect())),
        }
    }

    pub async fn add(&self, product_code: impl Into<String>) {
        self.codes.write().await.insert(product_code.into());
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn exists(&self, product_code: &str) -> Result<bool> {
        Ok(self.codes.read().await.contains(product_code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reserve_decrements() {
        let ledger = InMemoryStockLedger::with_stock([("BOOKS", 10)]);
        let movement = ledger.reserve("BOOKS", 3).await.unwrap();

        assert_eq!(movement.old_quantity, 10);
        assert_eq!(movement.order_quantity, 3);
        assert_eq!(movement.new_quantity, 7);
        assert_eq!(ledger.available("BOOKS").await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_reserve_out_of_stock() {
        let ledger = InMemoryStockLedger::with_stock([("BOOKS", 2)]);
        let result = ledger.reserve("BOOKS", 3).await;

        assert!(matches!(result, Err(ParticipantError::Validation(ref m)) if m == OUT_OF_STOCK));
        assert_eq!(ledger.available("BOOKS").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_reserve_exact_amount() {
        let ledger = InMemoryStockLedger::with_stock([("BOOKS", 2)]);
        let movement = ledger.reserve("BOOKS", 2).await.unwrap();
        assert_eq!(movement.new_quantity, 0);
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let ledger = InMemoryStockLedger::new();
        assert!(matches!(
            ledger.reserve("GAMES", 1).await,
            Err(ParticipantError::NotFound(_))
        ));
        assert!(ledger.release("GAMES", 1).await.is_err());
        assert_eq!(ledger.available("GAMES").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_release_restores() {
        let ledger = InMemoryStockLedger::with_stock([("MUSIC", 5)]);
        ledger.reserve("MUSIC", 5).await.unwrap();
        ledger.release("MUSIC", 5).await.unwrap();
        assert_eq!(ledger.available("MUSIC").await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_catalog() {
        let catalog = InMemoryProductCatalog::with_products(["MOVIES"]);
        assert!(catalog.exists("MOVIES").await.unwrap());
        assert!(!catalog.exists("BOOKS").await.unwrap());
        catalog.add("BOOKS").await;
        assert!(catalog.exists("BOOKS").await.unwrap());
    }
}
