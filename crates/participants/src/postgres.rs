//! PostgreSQL adapters for participant storage.

use std::marker::PhantomData;

use async_trait::async_trait;
use common::SagaKey;
use sqlx::PgPool;

use crate::error::{ParticipantError, Result};
use crate::repository::{Repository, SagaEntity};
use crate::stock::{OUT_OF_STOCK, ProductCatalog, StockLedger, StockMovement, inventory_not_found};

/// Runs the participant schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// Stores saga entities as JSONB rows, one row per `(kind, order, transaction)`.
pub struct PostgresRepository<T: SagaEntity> {
    pool: PgPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T: SagaEntity> Clone for PostgresRepository<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<T: SagaEntity> PostgresRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl<T: SagaEntity> Repository<T> for PostgresRepository<T> {
    async fn exists(&self, key: &SagaKey) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM saga_entities
                WHERE kind = $1 AND order_id = $2 AND transaction_id = $3
            )
            "#,
        )
        .bind(T::KIND)
        .bind(key.order_id.as_uuid())
        .bind(key.transaction_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, entity: T) -> Result<T> {
        let key = entity.key();
        let body = serde_json::to_value(&entity)?;

        let result = sqlx::query(
            r#"
            INSERT INTO saga_entities (kind, order_id, transaction_id, body, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (kind, order_id, transaction_id) DO NOTHING
            "#,
        )
        .bind(T::KIND)
        .bind(key.order_id.as_uuid())
        .bind(key.transaction_id.as_str())
        .bind(body)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ParticipantError::DuplicateTransaction(key.clone()));
        }
        Ok(entity)
    }

    async fn save(&self, entity: T) -> Result<T> {
        let key = entity.key();
        let body = serde_json::to_value(&entity)?;

        sqlx::query(
            r#"
            INSERT INTO saga_entities (kind, order_id, transaction_id, body, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (kind, order_id, transaction_id)
            DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()
            "#,
        )
        .bind(T::KIND)
        .bind(key.order_id.as_uuid())
        .bind(key.transaction_id.as_str())
        .bind(body)
        .execute(&self.pool)
        .await?;

        Ok(entity)
    }

    async fn remove(&self, key: &SagaKey) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM saga_entities
            WHERE kind = $1 AND order_id = $2 AND transaction_id = $3
            "#,
        )
        .bind(T::KIND)
        .bind(key.order_id.as_uuid())
        .bind(key.transaction_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_key(&self, key: &SagaKey) -> Result<Option<T>> {
        let body: Option<serde_json::Value> = sqlx::query_scalar(
            r#"
            SELECT body FROM saga_entities
            WHERE kind = $1 AND order_id = $2 AND transaction_id = $3
            "#,
        )
        .bind(T::KIND)
        .bind(key.order_id.as_uuid())
        .bind(key.transaction_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        body.map(serde_json::from_value)
            .transpose()
            .map_err(ParticipantError::from)
    }
}

/// Stock ledger backed by the `inventory_stock` table.
#[derive(Clone)]
pub struct PostgresStockLedger {
    pool: PgPool,
}

impl PostgresStockLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or overwrites the available units of a product.
    pub async fn set_stock(&self, product_code: &str, available: u32) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_stock (product_code, available)
            VALUES ($1, $2)
            ON CONFLICT (product_code) DO UPDATE SET available = EXCLUDED.available
            "#,
        )
        .bind(product_code)
        .bind(i64::from(available))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn to_units(value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| ParticipantError::Storage(format!("stock value {value} out of range")))
}

#[async_trait]
impl StockLedger for PostgresStockLedger {
    async fn available(&self, product_code: &str) -> Result<Option<u32>> {
        let available: Option<i64> =
            sqlx::query_scalar("SELECT available FROM inventory_stock WHERE product_code = $1")
                .bind(product_code)
                .fetch_optional(&self.pool)
                .await?;

        available.map(to_units).transpose()
    }

    async fn reserve(&self, product_code: &str, quantity: u32) -> Result<StockMovement> {
        // Single conditional update so concurrent sagas cannot oversell.
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE inventory_stock
            SET available = available - $2
            WHERE product_code = $1 AND available >= $2
            RETURNING available
            "#,
        )
        .bind(product_code)
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?;

        match remaining {
            Some(remaining) => {
                let new_quantity = to_units(remaining)?;
                Ok(StockMovement {
                    product_code: product_code.to_string(),
                    old_quantity: new_quantity + quantity,
                    order_quantity: quantity,
                    new_quantity,
                })
            }
            None => match self.available(product_code).await? {
                Some(_) => Err(ParticipantError::Validation(OUT_OF_STOCK.to_string())),
                None => Err(inventory_not_found(product_code)),
            },
        }
    }

    async fn release(&self, product_code: &str, quantity: u32) -> Result<()> {
        let result = sqlx::query(
            "UPDATE inventory_stock SET available = available + $2 WHERE product_code = $1",
        )
        .bind(product_code)
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(inventory_not_found(product_code));
        }
        Ok(())
    }
}

/// Product catalog backed by the `products` table.
#[derive(Clone)]
pub struct PostgresProductCatalog {
    pool: PgPool,
}

impl PostgresProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn add_product(&self, product_code: &str) -> Result<()> {
        sqlx::query("INSERT INTO products (code) VALUES ($1) ON CONFLICT (code) DO NOTHING")
            .bind(product_code)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for PostgresProductCatalog {
    async fn exists(&self, product_code: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE code = $1)")
                .bind(product_code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}
