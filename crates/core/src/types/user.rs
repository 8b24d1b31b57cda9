//! User identity as resolved by the external authentication service.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Customer,
    Dealer,
    Admin,
    Franchise,
    Supplier,
}

impl UserType {
    /// Stable string form used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Dealer => "dealer",
            Self::Admin => "admin",
            Self::Franchise => "franchise",
            Self::Supplier => "supplier",
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "dealer" => Ok(Self::Dealer),
            "admin" => Ok(Self::Admin),
            "franchise" => Ok(Self::Franchise),
            "supplier" => Ok(Self::Supplier),
            _ => Err(format!("invalid user type: {s}")),
        }
    }
}

/// Pricing rank of a dealer account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealerTier {
    Small,
    Medium,
    Large,
    MainDealer,
}

impl DealerTier {
    /// Stable string form used in storage and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::MainDealer => "main_dealer",
        }
    }
}

impl std::fmt::Display for DealerTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DealerTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            "main_dealer" => Ok(Self::MainDealer),
            _ => Err(format!("invalid dealer tier: {s}")),
        }
    }
}

/// The identity a checkout request runs as.
///
/// Loaded fresh for every request; never cached across requests because an
/// administrator may change a dealer's tier at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: UserId,
    pub user_type: UserType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealer_tier: Option<DealerTier>,
}

impl UserIdentity {
    /// A customer account.
    #[must_use]
    pub const fn customer(id: UserId) -> Self {
        Self {
            id,
            user_type: UserType::Customer,
            dealer_tier: None,
        }
    }

    /// A dealer account of the given tier.
    #[must_use]
    pub const fn dealer(id: UserId, tier: DealerTier) -> Self {
        Self {
            id,
            user_type: UserType::Dealer,
            dealer_tier: Some(tier),
        }
    }

    /// Whether this identity may use administrative endpoints.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }
}
