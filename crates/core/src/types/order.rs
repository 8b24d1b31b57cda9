//! Order snapshot types and their lifecycle rules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::{CampaignId, OrderId, ProductId, UserId};
use super::user::UserType;

/// Fulfilment status of an order.
///
/// Advances monotonically `pending → confirmed → shipped → delivered`.
/// `cancelled` is terminal and reachable from every other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Position along the forward path; `None` for `cancelled`.
    const fn rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::Shipped => Some(2),
            Self::Delivered => Some(3),
            Self::Cancelled => None,
        }
    }

    /// Whether an administrator may move an order from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self.rank(), next.rank()) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(from), Some(to)) => to > from,
        }
    }

    /// Whether cancelling from this state returns reserved units to stock.
    #[must_use]
    pub const fn restocks_on_cancel(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Payment status of an order. Leaves `unpaid` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Failed,
}

impl PaymentStatus {
    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }

    /// Whether no further payment transition is possible.
    #[must_use]
    pub const fn is_final(self) -> bool {
        !matches!(self, Self::Unpaid)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// Immutable copy of catalog data captured when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub quantity: u32,
    /// Server-resolved unit price.
    pub price: Decimal,
}

impl OrderItem {
    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Delivery destination and payer contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub email: Email,
    pub phone: String,
    pub address_line: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "TR".to_string()
}

impl ShippingAddress {
    /// Longest accepted value for any free-text address field.
    pub const MAX_FIELD_LENGTH: usize = 500;

    /// Check required fields, returning the name of the first offending one.
    ///
    /// # Errors
    ///
    /// Returns the camelCase field name when a required field is blank or a
    /// field exceeds [`Self::MAX_FIELD_LENGTH`].
    pub fn validate(&self) -> Result<(), &'static str> {
        let required = [
            ("shippingAddress.fullName", &self.full_name),
            ("shippingAddress.phone", &self.phone),
            ("shippingAddress.addressLine", &self.address_line),
            ("shippingAddress.city", &self.city),
            ("shippingAddress.country", &self.country),
        ];
        for (field, value) in required {
            if value.trim().is_empty() || value.len() > Self::MAX_FIELD_LENGTH {
                return Err(field);
            }
        }

        let optional = [
            ("shippingAddress.district", &self.district),
            ("shippingAddress.postalCode", &self.postal_code),
        ];
        for (field, value) in optional {
            if value
                .as_ref()
                .is_some_and(|v| v.len() > Self::MAX_FIELD_LENGTH)
            {
                return Err(field);
            }
        }

        if !self
            .phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'))
        {
            return Err("shippingAddress.phone");
        }

        Ok(())
    }

    /// Single-line rendering used by the payment gateway.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.address_line.trim().to_string()];
        if let Some(district) = self.district.as_deref().filter(|d| !d.trim().is_empty()) {
            parts.push(district.trim().to_string());
        }
        parts.push(self.city.trim().to_string());
        if let Some(code) = self.postal_code.as_deref().filter(|c| !c.trim().is_empty()) {
            parts.push(code.trim().to_string());
        }
        parts.push(self.country.trim().to_string());
        parts.join(", ")
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_type: UserType,
    pub items: Vec<OrderItem>,
    /// `Σ price × quantity`, fixed at creation.
    pub total_amount: Decimal,
    /// Server-derived campaign discount; zero when no campaign is attached.
    pub discount_amount: Decimal,
    pub free_shipping: bool,
    pub campaign_id: Option<CampaignId>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_provider: Option<String>,
    pub payment_token: Option<String>,
    pub payment_transaction_id: Option<String>,
    pub shipping_address: ShippingAddress,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Amount to collect through the payment gateway.
    #[must_use]
    pub fn payable_amount(&self) -> Decimal {
        (self.total_amount - self.discount_amount).max(Decimal::ZERO)
    }

    /// Whether a gateway payment may still be started for this order.
    #[must_use]
    pub fn is_payable(&self) -> bool {
        self.payment_status == PaymentStatus::Unpaid && self.status != OrderStatus::Cancelled
    }
}

/// Everything the storage layer needs to persist a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub user_type: UserType,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub free_shipping: bool,
    pub campaign_id: Option<CampaignId>,
    pub shipping_address: ShippingAddress,
    pub notes: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Ayse Yilmaz".to_string(),
            email: Email::parse("ayse@example.com").unwrap(),
            phone: "+90 555 000 0000".to_string(),
            address_line: "Ataturk Cd. 12".to_string(),
            city: "Izmir".to_string(),
            district: Some("Konak".to_string()),
            postal_code: None,
            country: "TR".to_string(),
        }
    }

    #[test]
    fn test_status_moves_forward_only() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Confirmed));
    }

    #[test]
    fn test_cancelled_is_terminal_and_reachable() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            assert!(status.can_transition_to(OrderStatus::Cancelled));
            assert!(!OrderStatus::Cancelled.can_transition_to(status));
        }
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_restock_only_before_shipping() {
        assert!(OrderStatus::Pending.restocks_on_cancel());
        assert!(OrderStatus::Confirmed.restocks_on_cancel());
        assert!(!OrderStatus::Shipped.restocks_on_cancel());
        assert!(!OrderStatus::Delivered.restocks_on_cancel());
    }

    #[test]
    fn test_status_strings_round_trip() {
        for status in ["pending", "confirmed", "shipped", "delivered", "cancelled"] {
            assert_eq!(status.parse::<OrderStatus>().unwrap().as_str(), status);
        }
        for status in ["unpaid", "paid", "failed"] {
            assert_eq!(status.parse::<PaymentStatus>().unwrap().as_str(), status);
        }
    }

    #[test]
    fn test_line_total() {
        let item = OrderItem {
            product_id: ProductId::new(1),
            name: "Tea".to_string(),
            sku: "TEA-1".to_string(),
            quantity: 3,
            price: Decimal::from(80),
        };
        assert_eq!(item.line_total(), Decimal::from(240));
    }

    #[test]
    fn test_address_validation() {
        assert!(address().validate().is_ok());

        let mut blank_city = address();
        blank_city.city = "  ".to_string();
        assert_eq!(blank_city.validate(), Err("shippingAddress.city"));

        let mut bad_phone = address();
        bad_phone.phone = "call me".to_string();
        assert_eq!(bad_phone.validate(), Err("shippingAddress.phone"));
    }

    #[test]
    fn test_address_one_line() {
        assert_eq!(address().one_line(), "Ataturk Cd. 12, Konak, Izmir, TR");
    }
}
