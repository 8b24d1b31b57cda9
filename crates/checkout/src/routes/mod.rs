//! HTTP route handlers for the checkout service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness
//! GET  /health/ready                        - Readiness (storage ping)
//!
//! # Customer API (rate limited)
//! GET  /api/products/{id}/price             - Resolved unit price
//! POST /api/orders                          - Place order
//! GET  /api/orders/{id}                     - Fetch own order
//! POST /api/campaigns/preview               - Evaluate campaign against a cart
//! POST /api/payments/paytr/token            - Start hosted payment
//!
//! # Provider
//! POST /api/payments/paytr/callback         - PayTR result notification
//!
//! # Admin
//! POST /api/admin/orders/{id}/status        - Advance order status
//! POST /api/admin/orders/{id}/payment       - Manual payment settlement
//! ```

pub mod admin;
pub mod campaigns;
pub mod orders;
pub mod payments;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tracing::warn;

use crate::middleware::api_rate_limiter;
use crate::state::AppState;
use crate::store::CheckoutStore;

/// Customer-facing API routes.
pub fn api_routes<S: CheckoutStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/products/{id}/price", get(products::price::<S>))
        .route("/api/orders", post(orders::create::<S>))
        .route("/api/orders/{id}", get(orders::show::<S>))
        .route("/api/campaigns/preview", post(campaigns::preview::<S>))
        .route("/api/payments/paytr/token", post(payments::token::<S>))
}

/// Routes called by the payment provider.
pub fn provider_routes<S: CheckoutStore>() -> Router<AppState<S>> {
    Router::new().route("/api/payments/paytr/callback", post(payments::callback::<S>))
}

/// Admin routes.
pub fn admin_routes<S: CheckoutStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/admin/orders/{id}/status", post(admin::set_status::<S>))
        .route("/api/admin/orders/{id}/payment", post(admin::set_payment::<S>))
}

/// All routes combined. Rate limiting keys on proxy headers, so it is only
/// enabled when running behind the edge proxy.
pub fn routes<S: CheckoutStore>(rate_limited: bool) -> Router<AppState<S>> {
    let api = if rate_limited {
        api_routes().layer(api_rate_limiter())
    } else {
        api_routes()
    };

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness::<S>))
        .merge(api)
        .merge(provider_routes())
        .merge(admin_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if storage is not reachable.
pub async fn readiness<S: CheckoutStore>(State(state): State<AppState<S>>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
