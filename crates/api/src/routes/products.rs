//! Product and stock endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use inventory::Product;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockRequest {
    pub stock_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub stock_count: u32,
    pub in_stock: bool,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            in_stock: product.in_stock(),
            id: product.id.to_string(),
            name: product.name,
            stock_count: product.stock_count,
        }
    }
}

/// GET /products
#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<ProductResponse>> {
    let products = state.fulfillment.inventory().get_all().await;
    Json(products.into_iter().map(ProductResponse::from).collect())
}

/// GET /products/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .fulfillment
        .inventory()
        .get_stock(&ProductId::new(id.as_str()))
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;

    Ok(Json(product.into()))
}

/// PUT /products/{id}/stock — set the stock level. Restocking a product
/// that was out of stock triggers the backlog drain on the bus.
#[tracing::instrument(skip(state))]
pub async fn update_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStockRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .fulfillment
        .inventory()
        .update_stock(&ProductId::new(id), req.stock_count)
        .await?;

    Ok(Json(product.into()))
}
