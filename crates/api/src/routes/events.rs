//! Finished saga lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::{OrderId, TransactionId};
use domain::Envelope;
use serde::Deserialize;
use transport::MessageBroker;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilters {
    pub order_id: Option<OrderId>,
    pub transaction_id: Option<TransactionId>,
}

/// GET /events — the final envelope of a saga, by order and/or transaction.
pub async fn find<B: MessageBroker + 'static>(
    State(state): State<Arc<AppState<B>>>,
    Query(filters): Query<EventFilters>,
) -> Result<Json<Envelope>, ApiError> {
    if filters.order_id.is_none() && filters.transaction_id.is_none() {
        return Err(ApiError::BadRequest(
            "orderId or transactionId must be informed".to_string(),
        ));
    }

    state
        .events
        .find(filters.order_id, filters.transaction_id.as_ref())
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No finished saga matches the filters".to_string()))
}

/// GET /events/all — every finished saga, newest first.
pub async fn all<B: MessageBroker + 'static>(
    State(state): State<Arc<AppState<B>>>,
) -> Json<Vec<Envelope>> {
    Json(state.events.all().await)
}
