//! HTTP API server with observability for the fulfillment saga.
//!
//! Exposes the order and inventory entry points over REST, with structured
//! logging (tracing) and Prometheus metrics. Everything past the entry
//! points happens on the bus.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, put};
use event_bus::InMemoryBus;
use fulfillment::{Fulfillment, seed};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub fulfillment: Fulfillment<InMemoryBus>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            get(routes::orders::list).post(routes::orders::create),
        )
        .route("/orders/{id}", get(routes::orders::get))
        .route("/products", get(routes::products::list))
        .route("/products/{id}", get(routes::products::get))
        .route("/products/{id}/stock", put(routes::products::update_stock))
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

/// Creates the default application state: the sample products, and the
/// sample orders when `seed_orders` is set.
pub fn create_default_state(bus: InMemoryBus, seed_orders: bool) -> Arc<AppState> {
    let orders = if seed_orders {
        seed::sample_orders()
    } else {
        Vec::new()
    };
    let fulfillment = Fulfillment::new(bus, seed::sample_products(), orders);

    Arc::new(AppState { fulfillment })
}
