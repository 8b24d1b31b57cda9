//! Administrative order and payment overrides.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Deserialize;
use tierstore_core::{Order, OrderId, OrderStatus, PaymentStatus};
use tracing::info;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::orders::OrderService;
use crate::services::payments::PaymentService;
use crate::state::AppState;
use crate::store::CheckoutStore;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// POST /api/admin/orders/{id}/status
///
/// # Errors
///
/// Returns `AppError::Order` for unknown orders or backward moves.
pub async fn set_status<S: CheckoutStore>(
    State(state): State<AppState<S>>,
    RequireAdmin(admin): RequireAdmin,
    Path(order_id): Path<OrderId>,
    payload: std::result::Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<Order>> {
    let Json(request) = payload?;
    let order = OrderService::new(state.store())
        .advance_status(order_id, request.status)
        .await?;
    info!(admin_id = %admin.id, order_id = %order_id, status = %order.status, "Order status changed");
    Ok(Json(order))
}

/// POST /api/admin/orders/{id}/payment
///
/// # Errors
///
/// Returns `AppError::Payment` if the order is not unpaid.
pub async fn set_payment<S: CheckoutStore>(
    State(state): State<AppState<S>>,
    RequireAdmin(admin): RequireAdmin,
    Path(order_id): Path<OrderId>,
    payload: std::result::Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<Json<Order>> {
    let Json(request) = payload?;
    let order = PaymentService::new(state.store(), state.paytr())
        .override_payment(
            order_id,
            request.payment_status,
            request.transaction_id.as_deref(),
        )
        .await?;
    info!(admin_id = %admin.id, order_id = %order_id, "Payment overridden by admin");
    Ok(Json(order))
}
