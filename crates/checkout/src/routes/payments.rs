//! PayTR token issuance and the provider callback.

use axum::{
    Form, Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use tierstore_core::OrderId;
use tracing::{error, info};

use crate::error::Result;
use crate::middleware::{ClientIp, RequireUser};
use crate::paytr::CallbackForm;
use crate::services::payments::{IssuedToken, PaymentError, PaymentService};
use crate::state::AppState;
use crate::store::CheckoutStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub order_id: OrderId,
}

/// POST /api/payments/paytr/token
///
/// # Errors
///
/// Returns `AppError::Payment`; the order is unchanged on failure.
pub async fn token<S: CheckoutStore>(
    State(state): State<AppState<S>>,
    RequireUser(user): RequireUser,
    ClientIp(ip): ClientIp,
    payload: std::result::Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<IssuedToken>> {
    let Json(request) = payload?;
    let issued = PaymentService::new(state.store(), state.paytr())
        .create_token(request.order_id, &user, &ip.to_string())
        .await?;
    Ok(Json(issued))
}

/// POST /api/payments/paytr/callback
///
/// PayTR retries until it sees a plain `OK`, so every parsed callback is
/// acknowledged whatever its outcome. Malformed forms are rejected by the
/// extractor.
pub async fn callback<S: CheckoutStore>(
    State(state): State<AppState<S>>,
    Form(form): Form<CallbackForm>,
) -> &'static str {
    match PaymentService::new(state.store(), state.paytr())
        .handle_callback(&form)
        .await
    {
        Ok(outcome) => info!(merchant_oid = %form.merchant_oid, %outcome, "PayTR callback processed"),
        Err(PaymentError::SignatureMismatch) => {}
        Err(e) => error!(merchant_oid = %form.merchant_oid, error = %e, "PayTR callback failed"),
    }
    "OK"
}
