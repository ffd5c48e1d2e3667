//! Wires the orchestrator and participants onto a broker.

use std::sync::Arc;

use participants::{
    InMemoryProductCatalog, InMemoryRepository, InMemoryStockLedger, InventoryParticipant,
    InventoryReservation, ParticipantHandler, Payment, PaymentParticipant, PostgresProductCatalog,
    PostgresRepository, PostgresStockLedger, ProductCatalog, ProductValidation,
    ProductValidationParticipant, Repository, StockLedger,
};
use saga::Orchestrator;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use transport::{MessageBroker, Producer};

use crate::error::ApiError;

/// Products available out of the box, with their initial stock.
pub const DEMO_STOCK: [(&str, u32); 4] = [
    ("COMIC_BOOKS", 10),
    ("BOOKS", 10),
    ("MOVIES", 10),
    ("MUSIC", 10),
];

/// Background consumers of one running saga system.
pub struct SagaRuntime {
    tasks: Vec<JoinHandle<()>>,
}

impl SagaRuntime {
    /// Starts every component with the given participant storage.
    ///
    /// All subscriptions exist when this returns, so a saga published right
    /// after is never missed.
    pub async fn spawn<B, V, P, I, S, C>(
        producer: &Producer<B>,
        validations: V,
        payments: P,
        reservations: I,
        stock: S,
        catalog: C,
    ) -> Result<Self, ApiError>
    where
        B: MessageBroker + Clone + 'static,
        V: Repository<ProductValidation> + 'static,
        P: Repository<Payment> + 'static,
        I: Repository<InventoryReservation> + 'static,
        S: StockLedger + 'static,
        C: ProductCatalog + 'static,
    {
        let orchestrator = Arc::new(Orchestrator::new(producer.clone()));
        let product_validation = Arc::new(ParticipantHandler::new(
            ProductValidationParticipant::new(validations, catalog),
            producer.clone(),
        ));
        let payment = Arc::new(ParticipantHandler::new(
            PaymentParticipant::new(payments),
            producer.clone(),
        ));
        let inventory = Arc::new(ParticipantHandler::new(
            InventoryParticipant::new(reservations, stock),
            producer.clone(),
        ));

        let tasks = vec![
            product_validation.listen().await?,
            payment.listen().await?,
            inventory.listen().await?,
            orchestrator.listen().await?,
        ];
        tracing::info!(components = tasks.len(), "saga runtime started");

        Ok(Self { tasks })
    }

    /// Starts the system with in-memory storage seeded with [`DEMO_STOCK`].
    pub async fn spawn_in_memory<B>(producer: &Producer<B>) -> Result<Self, ApiError>
    where
        B: MessageBroker + Clone + 'static,
    {
        Self::spawn(
            producer,
            InMemoryRepository::new(),
            InMemoryRepository::new(),
            InMemoryRepository::new(),
            InMemoryStockLedger::with_stock(DEMO_STOCK),
            InMemoryProductCatalog::with_products(DEMO_STOCK.map(|(code, _)| code)),
        )
        .await
    }

    /// Starts the system with PostgreSQL storage.
    ///
    /// Applies migrations and seeds [`DEMO_STOCK`] for products that have
    /// no stock row yet.
    pub async fn spawn_postgres<B>(producer: &Producer<B>, pool: PgPool) -> Result<Self, ApiError>
    where
        B: MessageBroker + Clone + 'static,
    {
        participants::run_migrations(&pool).await?;

        let stock = PostgresStockLedger::new(pool.clone());
        let catalog = PostgresProductCatalog::new(pool.clone());
        for (code, available) in DEMO_STOCK {
            catalog.add_product(code).await?;
            if stock.available(code).await?.is_none() {
                stock.set_stock(code, available).await?;
            }
        }

        Self::spawn(
            producer,
            PostgresRepository::new(pool.clone()),
            PostgresRepository::new(pool.clone()),
            PostgresRepository::new(pool),
            stock,
            catalog,
        )
        .await
    }

    /// Stops every consumer.
    pub fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}
