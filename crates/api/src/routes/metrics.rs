//! Prometheus metrics endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// Registers help text for the counters the services emit.
pub fn describe() {
    metrics::describe_counter!("cart_items_added_total", "Units moved from inventory into carts");
    metrics::describe_counter!("cart_items_removed_total", "Units moved from carts back into inventory");
    metrics::describe_counter!(
        "cart_operation_failures_total",
        "Failed cart operations by error code"
    );
    metrics::describe_counter!("inventory_items_created_total", "Inventory items created");
    metrics::describe_counter!("users_signed_up_total", "Customer signups");
}

/// GET /metrics: returns Prometheus-formatted metrics.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}
