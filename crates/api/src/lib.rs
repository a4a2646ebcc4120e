//! Payment status backend with observability.
//!
//! Serves the authoritative payment records that the result page reconciles
//! against: order registration, the payment-status lookup (with the optional
//! confirmation hint), and a provider webhook that settles payments. Comes
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{InMemoryPaymentRecordStore, PaymentRecordStore};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: PaymentRecordStore> {
    pub store: S,
    /// Lets a status lookup finalize a pending payment from a relayed
    /// provider success code.
    pub confirmation_hint_enabled: bool,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: PaymentRecordStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/{order_ref}", get(routes::orders::get::<S>))
        .route(
            "/payments/{order_ref}/status",
            get(routes::payments::status::<S>),
        )
        .route(
            "/payments/{order_ref}/webhook",
            post(routes::payments::webhook::<S>),
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

/// Creates the default application state backed by an in-memory store.
pub fn create_default_state(config: &Config) -> Arc<AppState<InMemoryPaymentRecordStore>> {
    Arc::new(AppState {
        store: InMemoryPaymentRecordStore::new(),
        confirmation_hint_enabled: config.confirmation_hint_enabled,
    })
}
