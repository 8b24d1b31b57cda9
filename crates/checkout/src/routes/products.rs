//! Product price lookup.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tierstore_core::{ProductId, resolve_price, resolve_visibility};

use crate::error::{AppError, Result};
use crate::middleware::OptionalUser;
use crate::state::AppState;
use crate::store::{CatalogStore, CheckoutStore};

/// Resolved unit price for the caller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub product_id: ProductId,
    pub price: Decimal,
    pub stock: u32,
}

/// GET /api/products/{id}/price
///
/// Hidden products answer 404, indistinguishable from missing ones.
///
/// # Errors
///
/// Returns `AppError::NotFound` for missing or hidden products and
/// `AppError::Pricing` for dealer accounts without a tier.
pub async fn price<S: CheckoutStore>(
    State(state): State<AppState<S>>,
    OptionalUser(user): OptionalUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<PriceResponse>> {
    let product = state
        .store()
        .product(product_id)
        .await?
        .filter(|p| resolve_visibility(&p.visibility, user.as_ref()))
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let price = resolve_price(&product.prices, user.as_ref())?;

    Ok(Json(PriceResponse {
        product_id,
        price,
        stock: product.stock,
    }))
}
