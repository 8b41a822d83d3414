//! HTTP and WebSocket API server for the order platform.
//!
//! Exposes the order, cart, catalog, and shipment endpoints plus the
//! real-time event stream, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use orderflow::{CartService, InventoryService, OrderAdminService, OrderCoordinator};
use realtime::{Broadcaster, SessionRegistry};
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/products/{id}/stock", put(routes::products::adjust_stock::<S>))
        .route(
            "/products/{id}/transactions",
            get(routes::products::transactions::<S>),
        )
        .route(
            "/cart",
            get(routes::cart::get::<S>).delete(routes::cart::clear::<S>),
        )
        .route("/cart/items", post(routes::cart::add_item::<S>))
        .route(
            "/cart/items/{product_id}",
            put(routes::cart::set_quantity::<S>).delete(routes::cart::remove_item::<S>),
        )
        .route(
            "/orders",
            post(routes::orders::place::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", put(routes::orders::update_status::<S>))
        .route("/orders/{id}/shipment", get(routes::orders::get_shipment::<S>))
        .route(
            "/orders/{id}/shipment/status",
            put(routes::orders::update_shipment::<S>),
        )
        .route("/ws", get(routes::ws::upgrade::<S>))
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

/// Wires the services over a store and an injected session registry.
pub fn create_state<S: Store + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    let registry = Arc::new(SessionRegistry::new());
    let broadcaster = Broadcaster::new(registry.clone());

    Arc::new(AppState {
        coordinator: OrderCoordinator::new(store.clone(), broadcaster.clone()),
        cart: CartService::new(store.clone(), broadcaster.clone()),
        inventory: InventoryService::new(store.clone(), broadcaster.clone()),
        admin: OrderAdminService::new(store.clone(), broadcaster),
        registry,
        store,
    })
}
