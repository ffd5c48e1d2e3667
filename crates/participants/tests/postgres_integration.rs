//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p participants --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::{OrderId, SagaKey, TransactionId};
use domain::Money;
use participants::{
    ParticipantError, Payment, PaymentStatus, PostgresProductCatalog, PostgresRepository,
    PostgresStockLedger, ProductCatalog, ProductValidation, Repository, StockLedger,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_participant_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Fresh pool with cleared tables
async fn get_test_pool() -> PgPool {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE saga_entities, products, inventory_stock")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

fn key() -> SagaKey {
    SagaKey::new(OrderId::new(), TransactionId::generate())
}

#[tokio::test]
async fn test_repository_save_and_find() {
    let repo = PostgresRepository::<Payment>::new(get_test_pool().await);
    let key = key();
    assert!(!repo.exists(&key).await.unwrap());

    let payment = Payment {
        key: key.clone(),
        total_amount: Money::from_cents(4500),
        total_items: 3,
        status: PaymentStatus::Success,
    };
    repo.save(payment.clone()).await.unwrap();

    assert!(repo.exists(&key).await.unwrap());
    assert_eq!(repo.find_by_key(&key).await.unwrap(), Some(payment));
}

#[tokio::test]
async fn test_repository_upsert() {
    let repo = PostgresRepository::<Payment>::new(get_test_pool().await);
    let mut payment = Payment {
        key: key(),
        total_amount: Money::from_cents(100),
        total_items: 1,
        status: PaymentStatus::Success,
    };
    repo.save(payment.clone()).await.unwrap();

    payment.status = PaymentStatus::Refund;
    repo.save(payment.clone()).await.unwrap();

    let stored = repo.find_by_key(&payment.key).await.unwrap().unwrap();
    assert_eq!(stored.status, PaymentStatus::Refund);
}

#[tokio::test]
async fn test_repository_insert_claims_key_once() {
    let repo = PostgresRepository::<Payment>::new(get_test_pool().await);
    let payment = Payment {
        key: key(),
        total_amount: Money::from_cents(100),
        total_items: 1,
        status: PaymentStatus::Success,
    };

    let mut tasks = Vec::new();
    for _ in 0..5 {
        let repo = repo.clone();
        let payment = payment.clone();
        tasks.push(tokio::spawn(async move { repo.insert(payment).await }));
    }

    let mut inserted = 0;
    let mut duplicates = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => inserted += 1,
            Err(ParticipantError::DuplicateTransaction(_)) => duplicates += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(inserted, 1);
    assert_eq!(duplicates, 4);
}

#[tokio::test]
async fn test_repository_remove() {
    let repo = PostgresRepository::<Payment>::new(get_test_pool().await);
    let payment = Payment {
        key: key(),
        total_amount: Money::from_cents(100),
        total_items: 1,
        status: PaymentStatus::Success,
    };
    repo.insert(payment.clone()).await.unwrap();

    repo.remove(&payment.key).await.unwrap();

    assert!(!repo.exists(&payment.key).await.unwrap());
    repo.insert(payment).await.unwrap();
}

#[tokio::test]
async fn test_entity_kinds_are_isolated() {
    let pool = get_test_pool().await;
    let payments = PostgresRepository::<Payment>::new(pool.clone());
    let validations = PostgresRepository::<ProductValidation>::new(pool);
    let key = key();

    validations
        .save(ProductValidation {
            key: key.clone(),
            success: true,
        })
        .await
        .unwrap();

    assert!(validations.exists(&key).await.unwrap());
    assert!(!payments.exists(&key).await.unwrap());
}

#[tokio::test]
async fn test_stock_reserve_and_release() {
    let ledger = PostgresStockLedger::new(get_test_pool().await);
    ledger.set_stock("BOOKS", 5).await.unwrap();

    let movement = ledger.reserve("BOOKS", 2).await.unwrap();
    assert_eq!(movement.old_quantity, 5);
    assert_eq!(movement.new_quantity, 3);

    let result = ledger.reserve("BOOKS", 4).await;
    assert!(matches!(result, Err(ParticipantError::Validation(_))));
    assert_eq!(ledger.available("BOOKS").await.unwrap(), Some(3));

    ledger.release("BOOKS", 2).await.unwrap();
    assert_eq!(ledger.available("BOOKS").await.unwrap(), Some(5));
}

#[tokio::test]
async fn test_stock_unknown_product() {
    let ledger = PostgresStockLedger::new(get_test_pool().await);
    assert!(matches!(
        ledger.reserve("GAMES", 1).await,
        Err(ParticipantError::NotFound(_))
    ));
    assert!(matches!(
        ledger.release("GAMES", 1).await,
        Err(ParticipantError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_concurrent_reserve_never_oversells() {
    let ledger = PostgresStockLedger::new(get_test_pool().await);
    ledger.set_stock("MUSIC", 4).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let ledger = ledger.clone();
        tasks.push(tokio::spawn(
            async move { ledger.reserve("MUSIC", 1).await },
        ));
    }

    let mut reserved = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            reserved += 1;
        }
    }

    assert_eq!(reserved, 4);
    assert_eq!(ledger.available("MUSIC").await.unwrap(), Some(0));
}

#[tokio::test]
async fn test_product_catalog() {
    let catalog = PostgresProductCatalog::new(get_test_pool().await);
    catalog.add_product("COMIC_BOOKS").await.unwrap();
    catalog.add_product("COMIC_BOOKS").await.unwrap();

    assert!(catalog.exists("COMIC_BOOKS").await.unwrap());
    assert!(!catalog.exists("GAMES").await.unwrap());
}
