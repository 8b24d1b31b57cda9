//! Order placement and lookup.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::Utc;
use tierstore_core::{Order, OrderId};

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::services::orders::{OrderRequest, OrderService};
use crate::state::AppState;
use crate::store::CheckoutStore;

/// POST /api/orders
///
/// # Errors
///
/// Returns the order service error; stock is untouched on failure.
pub async fn create<S: CheckoutStore>(
    State(state): State<AppState<S>>,
    RequireUser(user): RequireUser,
    payload: std::result::Result<Json<OrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>)> {
    let Json(request) = payload?;
    let order = OrderService::new(state.store())
        .create_order(&user, request, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders/{id}
///
/// Other users' orders answer 404.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the order is missing or not visible.
pub async fn show<S: CheckoutStore>(
    State(state): State<AppState<S>>,
    RequireUser(user): RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.store()).get(order_id).await?;
    if order.user_id != user.id && !user.is_admin() {
        return Err(AppError::NotFound(format!("order {order_id}")));
    }
    Ok(Json(order))
}
