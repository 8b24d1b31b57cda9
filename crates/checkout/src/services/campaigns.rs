//! Campaign previews for the cart view.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tierstore_core::campaign::{CartSnapshot, EvaluationOutcome, evaluate};
use tierstore_core::{CampaignId, UserIdentity};

use crate::db::RepositoryError;
use crate::store::CampaignStore;

/// Errors from campaign previews.
#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("invalid {0}: out of range")]
    OutOfRange(&'static str),

    #[error("campaign {0} not found")]
    NotFound(CampaignId),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Evaluate a campaign against a client-described cart.
///
/// The cart totals come from the client and are only trusted for display;
/// order placement re-derives them. Usage counters are not touched.
///
/// # Errors
///
/// Returns [`CampaignError::OutOfRange`] for negative or oversized amounts
/// and [`CampaignError::NotFound`] if the campaign does not exist.
pub async fn preview<S: CampaignStore>(
    store: &S,
    campaign_id: CampaignId,
    cart: &CartSnapshot,
    user: Option<&UserIdentity>,
    now: DateTime<Utc>,
) -> Result<EvaluationOutcome, CampaignError> {
    if let Some(field) = cart.out_of_range_field() {
        return Err(CampaignError::OutOfRange(field));
    }

    let campaign = store
        .campaign(campaign_id)
        .await?
        .ok_or(CampaignError::NotFound(campaign_id))?;

    Ok(evaluate(&campaign, cart, user, now))
}
