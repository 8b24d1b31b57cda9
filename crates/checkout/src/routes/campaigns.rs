//! Campaign preview.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use chrono::Utc;
use serde::Deserialize;
use tierstore_core::CampaignId;
use tierstore_core::campaign::{CartSnapshot, EvaluationOutcome};

use crate::error::Result;
use crate::middleware::OptionalUser;
use crate::services::campaigns;
use crate::state::AppState;
use crate::store::CheckoutStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub campaign_id: CampaignId,
    pub cart: CartSnapshot,
}

/// POST /api/campaigns/preview
///
/// A campaign that does not apply is a `200` with `outcome: "rejected"`.
///
/// # Errors
///
/// Returns `AppError::Campaign` if the campaign does not exist.
pub async fn preview<S: CheckoutStore>(
    State(state): State<AppState<S>>,
    OptionalUser(user): OptionalUser,
    payload: std::result::Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<EvaluationOutcome>> {
    let Json(request) = payload?;
    let outcome = campaigns::preview(
        state.store(),
        request.campaign_id,
        &request.cart,
        user.as_ref(),
        Utc::now(),
    )
    .await?;
    Ok(Json(outcome))
}
