//! Promotional campaigns.
//!
//! A campaign is a time-bounded, audience-scoped rule of one of four fixed
//! shapes, modelled as [`CampaignRule`]. Evaluation against a cart lives in
//! [`evaluate`](mod@evaluate) and never mutates the campaign.

pub mod evaluate;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CampaignId, CategoryId, DealerTier, ProductId, UserType};

pub use evaluate::{
    CartSnapshot, CartSnapshotLine, Evaluation, EvaluationOutcome, Rejection, evaluate,
};

/// Discriminant of a [`CampaignRule`], stored alongside the rule document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignType {
    BuyOneGetOne,
    CartDiscount,
    FreeShipping,
    CategoryDiscount,
}

impl CampaignType {
    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BuyOneGetOne => "buy_one_get_one",
            Self::CartDiscount => "cart_discount",
            Self::FreeShipping => "free_shipping",
            Self::CategoryDiscount => "category_discount",
        }
    }
}

impl std::fmt::Display for CampaignType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a monetary discount is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `value` percent of the base amount.
    Percentage,
    /// `value` currency units off the base amount.
    Fixed,
}

/// Whole-cart discount once the cart reaches a minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDiscount {
    pub discount_type: DiscountType,
    pub value: Decimal,
    #[serde(default)]
    pub min_cart_amount: Decimal,
    #[serde(default)]
    pub max_discount: Option<Decimal>,
}

/// Shipping waiver once the cart reaches a minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeShipping {
    #[serde(default)]
    pub min_cart_amount: Decimal,
}

/// Discount restricted to lines in the given categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDiscount {
    pub category_ids: BTreeSet<CategoryId>,
    pub discount_type: DiscountType,
    pub value: Decimal,
    #[serde(default)]
    pub max_discount: Option<Decimal>,
}

/// Free units of matching products. The unit adjustment is applied by the
/// cart view; evaluation only reports which products qualify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyOneGetOne {
    /// Qualifying products; empty means every product.
    #[serde(default)]
    pub product_ids: BTreeSet<ProductId>,
    pub buy_quantity: u32,
    pub free_quantity: u32,
}

/// The type-specific part of a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CampaignRule {
    BuyOneGetOne(BuyOneGetOne),
    CartDiscount(CartDiscount),
    FreeShipping(FreeShipping),
    CategoryDiscount(CategoryDiscount),
}

impl CampaignRule {
    /// The discriminant of this rule.
    #[must_use]
    pub const fn campaign_type(&self) -> CampaignType {
        match self {
            Self::BuyOneGetOne(_) => CampaignType::BuyOneGetOne,
            Self::CartDiscount(_) => CampaignType::CartDiscount,
            Self::FreeShipping(_) => CampaignType::FreeShipping,
            Self::CategoryDiscount(_) => CampaignType::CategoryDiscount,
        }
    }
}

/// Audience segment; `all` matches every user type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudienceSegment {
    All,
    Customer,
    Dealer,
    Admin,
    Franchise,
    Supplier,
}

impl From<UserType> for AudienceSegment {
    fn from(user_type: UserType) -> Self {
        match user_type {
            UserType::Customer => Self::Customer,
            UserType::Dealer => Self::Dealer,
            UserType::Admin => Self::Admin,
            UserType::Franchise => Self::Franchise,
            UserType::Supplier => Self::Supplier,
        }
    }
}

/// Who a campaign is offered to. Empty sets place no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAudience {
    #[serde(default)]
    pub user_types: BTreeSet<AudienceSegment>,
    #[serde(default)]
    pub dealer_tiers: BTreeSet<DealerTier>,
}

impl TargetAudience {
    /// Whether the user type is part of the audience.
    #[must_use]
    pub fn admits_user_type(&self, user_type: UserType) -> bool {
        self.user_types.is_empty()
            || self.user_types.contains(&AudienceSegment::All)
            || self.user_types.contains(&AudienceSegment::from(user_type))
    }

    /// Whether the dealer tier is part of the audience.
    #[must_use]
    pub fn admits_dealer_tier(&self, tier: Option<DealerTier>) -> bool {
        self.dealer_tiers.is_empty() || tier.is_some_and(|t| self.dealer_tiers.contains(&t))
    }
}

/// Redemption limits and the running redemption count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLimit {
    #[serde(default)]
    pub total_usage: Option<u32>,
    #[serde(default)]
    pub per_user: Option<u32>,
    #[serde(default)]
    pub current_usage: u32,
}

impl UsageLimit {
    /// Whether the total redemption cap has been reached.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.total_usage
            .is_some_and(|total| self.current_usage >= total)
    }
}

/// Read-time lifecycle state of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignState {
    /// Draft or switched off.
    Inactive,
    /// Active flag set but the window has not opened.
    Scheduled,
    Active,
    Expired,
    /// Total redemption cap reached.
    Exhausted,
}

/// A promotional campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    #[serde(default)]
    pub target_audience: TargetAudience,
    #[serde(default)]
    pub usage_limit: UsageLimit,
    pub rule: CampaignRule,
}

/// Problems with a campaign definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CampaignDefinitionError {
    #[error("end date precedes start date")]
    InvertedWindow,
    #[error("percentage must be between 0 and 100")]
    PercentageOutOfRange,
    #[error("{0} cannot be negative")]
    Negative(&'static str),
    #[error("buy and free quantities must be at least 1")]
    ZeroQuantity,
    #[error("category discount needs at least one category")]
    NoCategories,
}

impl Campaign {
    /// The campaign's type.
    #[must_use]
    pub const fn campaign_type(&self) -> CampaignType {
        self.rule.campaign_type()
    }

    /// Lifecycle state at `now`.
    #[must_use]
    pub fn state(&self, now: DateTime<Utc>) -> CampaignState {
        if !self.is_active {
            CampaignState::Inactive
        } else if now < self.start_date {
            CampaignState::Scheduled
        } else if now > self.end_date {
            CampaignState::Expired
        } else if self.usage_limit.is_exhausted() {
            CampaignState::Exhausted
        } else {
            CampaignState::Active
        }
    }

    /// Whether the campaign can be applied at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.state(now) == CampaignState::Active
    }

    /// Check the definition for values evaluation cannot make sense of.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), CampaignDefinitionError> {
        if self.end_date < self.start_date {
            return Err(CampaignDefinitionError::InvertedWindow);
        }

        let check_discount = |discount_type: DiscountType,
                              value: Decimal,
                              max: Option<Decimal>|
         -> Result<(), CampaignDefinitionError> {
            if value.is_sign_negative() {
                return Err(CampaignDefinitionError::Negative("value"));
            }
            if discount_type == DiscountType::Percentage && value > Decimal::ONE_HUNDRED {
                return Err(CampaignDefinitionError::PercentageOutOfRange);
            }
            if max.is_some_and(|m| m.is_sign_negative()) {
                return Err(CampaignDefinitionError::Negative("maxDiscount"));
            }
            Ok(())
        };

        match &self.rule {
            CampaignRule::CartDiscount(rule) => {
                if rule.min_cart_amount.is_sign_negative() {
                    return Err(CampaignDefinitionError::Negative("minCartAmount"));
                }
                check_discount(rule.discount_type, rule.value, rule.max_discount)
            }
            CampaignRule::FreeShipping(rule) => {
                if rule.min_cart_amount.is_sign_negative() {
                    return Err(CampaignDefinitionError::Negative("minCartAmount"));
                }
                Ok(())
            }
            CampaignRule::CategoryDiscount(rule) => {
                if rule.category_ids.is_empty() {
                    return Err(CampaignDefinitionError::NoCategories);
                }
                check_discount(rule.discount_type, rule.value, rule.max_discount)
            }
            CampaignRule::BuyOneGetOne(rule) => {
                if rule.buy_quantity == 0 || rule.free_quantity == 0 {
                    return Err(CampaignDefinitionError::ZeroQuantity);
                }
                Ok(())
            }
        }
    }
}
