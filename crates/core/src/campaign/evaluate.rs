//! Pure evaluation of a campaign against a cart snapshot.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::{Campaign, CampaignRule, CampaignState, CampaignType, DiscountType};
use crate::types::{CampaignId, CategoryId, ProductId, UserIdentity, UserType};

/// One line of the cart as the evaluator sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshotLine {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// `unit price × quantity` for this line.
    pub subtotal: Decimal,
}

/// The cart being priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub total: Decimal,
    #[serde(default)]
    pub items: Vec<CartSnapshotLine>,
}

impl CartSnapshot {
    /// Largest amount a `NUMERIC(12, 2)` column holds.
    pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

    /// First field holding an amount outside `0..=MAX_AMOUNT`, if any.
    #[must_use]
    pub fn out_of_range_field(&self) -> Option<&'static str> {
        let in_range = |amount: Decimal| (Decimal::ZERO..=Self::MAX_AMOUNT).contains(&amount);
        if !in_range(self.total) {
            return Some("cart.total");
        }
        if !self.items.iter().all(|line| in_range(line.subtotal)) {
            return Some("cart.items.subtotal");
        }
        None
    }
}

/// A successful evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub campaign_id: CampaignId,
    pub campaign_type: CampaignType,
    pub discount: Decimal,
    pub free_shipping: bool,
    pub eligible_product_ids: BTreeSet<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_quantity: Option<u32>,
    /// How much more the cart needs before a threshold rule kicks in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_to_qualify: Option<Decimal>,
    pub new_total: Decimal,
}

/// Why a campaign does not apply to this user at this time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Rejection {
    #[error("campaign is not live ({state:?})")]
    NotLive { state: CampaignState },
    #[error("campaign is not offered to this user type")]
    AudienceMismatch,
    #[error("campaign is not offered to this dealer tier")]
    DealerTierMismatch,
}

/// Result of [`evaluate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    Applied(Evaluation),
    Rejected { reason: Rejection },
}

impl EvaluationOutcome {
    /// The evaluation, if the campaign applied.
    #[must_use]
    pub const fn applied(&self) -> Option<&Evaluation> {
        match self {
            Self::Applied(evaluation) => Some(evaluation),
            Self::Rejected { .. } => None,
        }
    }
}

/// Round a money amount to cents, midpoint away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Evaluate `campaign` for `user` against `cart` at `now`.
///
/// Anonymous users are evaluated as customers. Never mutates the campaign;
/// calling it twice with the same inputs yields the same outcome.
#[must_use]
pub fn evaluate(
    campaign: &Campaign,
    cart: &CartSnapshot,
    user: Option<&UserIdentity>,
    now: DateTime<Utc>,
) -> EvaluationOutcome {
    let state = campaign.state(now);
    if state != CampaignState::Active {
        return EvaluationOutcome::Rejected {
            reason: Rejection::NotLive { state },
        };
    }

    let user_type = user.map_or(UserType::Customer, |u| u.user_type);
    if !campaign.target_audience.admits_user_type(user_type) {
        return EvaluationOutcome::Rejected {
            reason: Rejection::AudienceMismatch,
        };
    }
    if user_type == UserType::Dealer
        && !campaign
            .target_audience
            .admits_dealer_tier(user.and_then(|u| u.dealer_tier))
    {
        return EvaluationOutcome::Rejected {
            reason: Rejection::DealerTierMismatch,
        };
    }

    let total = cart.total.max(Decimal::ZERO);
    let mut evaluation = Evaluation {
        campaign_id: campaign.id,
        campaign_type: campaign.campaign_type(),
        discount: Decimal::ZERO,
        free_shipping: false,
        eligible_product_ids: BTreeSet::new(),
        free_quantity: None,
        amount_to_qualify: None,
        new_total: round_money(total),
    };

    match &campaign.rule {
        CampaignRule::CartDiscount(rule) => {
            if total >= rule.min_cart_amount {
                evaluation.discount =
                    discount_on(total, rule.discount_type, rule.value, rule.max_discount);
            } else {
                evaluation.amount_to_qualify = Some(round_money(rule.min_cart_amount - total));
            }
        }
        CampaignRule::FreeShipping(rule) => {
            if total >= rule.min_cart_amount {
                evaluation.free_shipping = true;
            } else {
                evaluation.amount_to_qualify = Some(round_money(rule.min_cart_amount - total));
            }
        }
        CampaignRule::CategoryDiscount(rule) => {
            let matching = cart
                .items
                .iter()
                .filter(|line| {
                    line.category_id
                        .is_some_and(|c| rule.category_ids.contains(&c))
                })
                .collect::<Vec<_>>();
            let base = matching
                .iter()
                .map(|line| line.subtotal.max(Decimal::ZERO))
                .fold(Decimal::ZERO, Decimal::saturating_add)
                .min(total);
            evaluation.eligible_product_ids =
                matching.iter().filter_map(|line| line.product_id).collect();
            evaluation.discount = discount_on(base, rule.discount_type, rule.value, rule.max_discount);
        }
        CampaignRule::BuyOneGetOne(rule) => {
            evaluation.eligible_product_ids = cart
                .items
                .iter()
                .filter_map(|line| line.product_id)
                .filter(|id| rule.product_ids.is_empty() || rule.product_ids.contains(id))
                .collect();
            evaluation.free_quantity = Some(rule.free_quantity);
        }
    }

    evaluation.new_total = round_money((total - evaluation.discount).max(Decimal::ZERO));
    EvaluationOutcome::Applied(evaluation)
}

/// Discount on `base`, never negative and never more than `base`.
fn discount_on(
    base: Decimal,
    discount_type: DiscountType,
    value: Decimal,
    max_discount: Option<Decimal>,
) -> Decimal {
    let value = value.max(Decimal::ZERO);
    let raw = match discount_type {
        DiscountType::Percentage => base.saturating_mul(value / Decimal::ONE_HUNDRED),
        DiscountType::Fixed => value,
    };
    let capped = max_discount.map_or(raw, |max| raw.min(max.max(Decimal::ZERO)));
    round_money(capped.min(base).max(Decimal::ZERO))
}
