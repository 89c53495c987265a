//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, ProductId};
use orders::Order;
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub product_id: String,
    pub quantity: u32,
}

/// POST /orders — place an order. Fulfillment happens asynchronously, so
/// the returned order is always `placed`.
#[tracing::instrument(skip(state))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    if req.product_id.trim().is_empty() {
        return Err(ApiError::BadRequest("productId is required".to_string()));
    }

    let order = state
        .fulfillment
        .orders()
        .create(ProductId::new(req.product_id), req.quantity)
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let not_found = || ApiError::NotFound(format!("Order {id} not found"));

    // An ID that does not parse cannot name an order.
    let order_id: OrderId = id.parse().map_err(|_| not_found())?;
    let order = state
        .fulfillment
        .orders()
        .get_by_id(&order_id)
        .await
        .ok_or_else(not_found)?;

    Ok(Json(order))
}

/// GET /orders
#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<Order>> {
    Json(state.fulfillment.orders().get_all().await)
}
