//! Prometheus metrics endpoint and metric descriptions.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use metrics::{Unit, describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusHandle;

/// Registers help text for the metrics the saga records.
pub fn describe() {
    describe_counter!("orders_created_total", "Orders accepted by the order ledger");
    describe_counter!(
        "order_status_transitions_total",
        "Order status changes, labelled by target status"
    );
    describe_counter!(
        "stock_reservations_total",
        "Reservation attempts, labelled by outcome"
    );
    describe_counter!("stock_restocks_total", "Stock level replacements");
    describe_counter!(
        "backlog_drain_fulfilled_total",
        "Pending orders fulfilled by a backlog drain"
    );
    describe_histogram!(
        "backlog_drain_duration_seconds",
        Unit::Seconds,
        "Time spent draining one product's backlog"
    );
    describe_counter!("bus_messages_published_total", "Messages accepted by the bus");
    describe_counter!("bus_publish_failures_total", "Publishes that were lost");
    describe_counter!(
        "router_messages_dispatched_total",
        "Messages handled by the event router"
    );
    describe_counter!(
        "router_messages_dropped_total",
        "Messages the event router could not handle, labelled by reason"
    );
}

/// GET /metrics — returns Prometheus-formatted metrics.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}
