//! HTTP API server with observability for the storefront.
//!
//! Provides REST endpoints for the catalog, the shopper's cart and checkout,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use checkout::{CartService, CheckoutService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{CheckoutStore, ProductCatalog};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, C>(state: Arc<AppState<S, C>>, metrics_handle: PrometheusHandle) -> Router
where
    S: CheckoutStore + 'static,
    C: ProductCatalog + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/products", get(routes::products::list::<S, C>))
        .route("/api/products/{id}", get(routes::products::get::<S, C>))
        .route(
            "/api/cart",
            get(routes::cart::get::<S, C>).delete(routes::cart::clear::<S, C>),
        )
        .route("/api/cart/items", post(routes::cart::add_item::<S, C>))
        .route(
            "/api/cart/items/{product_id}",
            put(routes::cart::update_item::<S, C>).delete(routes::cart::remove_item::<S, C>),
        )
        .route(
            "/api/orders/checkout",
            post(routes::orders::checkout::<S, C>),
        )
        .route("/api/orders", get(routes::orders::list::<S, C>))
        .route("/api/orders/{id}", get(routes::orders::get::<S, C>))
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

/// Creates the application state over a store and a catalog.
pub fn create_state<S, C>(store: S, catalog: C, config: &Config) -> Arc<AppState<S, C>>
where
    S: CheckoutStore + Clone + 'static,
    C: ProductCatalog + 'static,
{
    let storefront = config.storefront();

    Arc::new(AppState {
        carts: CartService::new(store.clone(), catalog, storefront),
        checkout: CheckoutService::new(store, storefront),
        guest_cookie_max_age_secs: config.guest_cookie_max_age_secs(),
    })
}
