//! Saga trigger endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{OrderId, TransactionId};
use domain::{Envelope, EventSource, Order, OrderProduct, Topic};
use serde::{Deserialize, Serialize};
use transport::MessageBroker;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub products: Vec<OrderProduct>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub order_id: OrderId,
    pub transaction_id: TransactionId,
}

/// POST /orders — creates an order and starts its saga.
///
/// Product checks belong to the saga; an order the participants reject still
/// gets accepted here and ends with status `FAIL`.
#[tracing::instrument(skip_all)]
pub async fn create<B: MessageBroker + 'static>(
    State(state): State<Arc<AppState<B>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let order = Order::new(req.products);
    let envelope = Envelope::new(order, EventSource::OrderService);

    state
        .producer
        .send_event(Topic::StartSaga.as_str(), &envelope)
        .await?;

    metrics::counter!("orders_created_total").increment(1);
    tracing::info!(
        order_id = %envelope.order_id,
        transaction_id = %envelope.transaction_id,
        "saga requested"
    );

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            order_id: envelope.order_id,
            transaction_id: envelope.transaction_id,
        }),
    ))
}
