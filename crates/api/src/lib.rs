//! HTTP API server for the cart backend.
//!
//! Provides REST endpoints for signup/login, inventory and customer carts,
//! with bearer-token authentication, role-based access control, structured
//! logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod rbac;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use auth::JwtKeys;
pub use config::Config;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/status", get(routes::health::status))
        .route("/deepstatus", get(routes::health::deep_status::<S>))
        .route("/v1/user/signup", post(routes::user::signup::<S>))
        .route("/v1/user/login", post(routes::user::login::<S>))
        .route(
            "/v1/customer/{id}/suspend",
            delete(routes::customer::suspend::<S>),
        )
        .route(
            "/v1/inventory/items",
            get(routes::inventory::list::<S>).post(routes::inventory::create::<S>),
        )
        .route("/v1/inventory/items/{id}", get(routes::inventory::get::<S>))
        .route("/v1/cart", get(routes::cart::get::<S>))
        .route("/v1/cart/items/{item_id}", post(routes::cart::add_item::<S>))
        .route(
            "/v1/cart/line-items/{line_id}",
            delete(routes::cart::remove_item::<S>),
        )
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

/// Creates the application state over a store.
pub fn create_state<S: Store + Clone + 'static>(store: S, config: &Config) -> Arc<AppState<S>> {
    let jwt = JwtKeys::new(&config.jwt_secret, config.jwt_expire_minutes);
    Arc::new(AppState::new(store, jwt))
}
