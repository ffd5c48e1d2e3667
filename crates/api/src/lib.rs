//! HTTP front door and runtime wiring for the order saga.
//!
//! Accepts orders over REST, hands them to the orchestrator through
//! `start-saga` and records every finished saga from `notify-ending`, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod event_log;
pub mod routes;
pub mod runtime;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use transport::{MessageBroker, Producer};

pub use event_log::EventLog;
pub use runtime::SagaRuntime;

/// Shared application state accessible from all handlers.
pub struct AppState<B: MessageBroker> {
    pub producer: Producer<B>,
    pub events: EventLog,
}

impl<B: MessageBroker> AppState<B> {
    pub fn new(producer: Producer<B>, events: EventLog) -> Self {
        Self { producer, events }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<B: MessageBroker + 'static>(
    state: Arc<AppState<B>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<B>))
        .route("/events", get(routes::events::find::<B>))
        .route("/events/all", get(routes::events::all::<B>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Starts the event log and an in-memory saga runtime on `broker`.
pub async fn create_default_state<B: MessageBroker + Clone + 'static>(
    broker: B,
) -> Result<(Arc<AppState<B>>, SagaRuntime), error::ApiError> {
    let producer = Producer::new(broker);
    let events = EventLog::new();
    events.listen(producer.broker()).await?;
    let runtime = SagaRuntime::spawn_in_memory(&producer).await?;

    Ok((Arc::new(AppState::new(producer, events)), runtime))
}
