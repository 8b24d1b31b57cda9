//! PayTR wire types.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// One basket line as PayTR expects it: `[name, "unit price", quantity]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasketLine(pub String, pub String, pub u32);

impl BasketLine {
    /// Build a line, formatting the unit price with two decimals.
    #[must_use]
    pub fn new(name: &str, unit_price: Decimal, quantity: u32) -> Self {
        Self(name.to_string(), format!("{:.2}", unit_price.round_dp(2)), quantity)
    }
}

/// Everything needed to mint a token for one order.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub user_ip: String,
    pub merchant_oid: String,
    pub email: String,
    /// Payable amount in minor units (kuruş).
    pub payment_amount: i64,
    pub basket: Vec<BasketLine>,
    pub user_name: String,
    pub user_address: String,
    pub user_phone: String,
}

/// Form body POSTed to the token endpoint.
#[derive(Debug, Serialize)]
pub struct TokenForm<'a> {
    pub merchant_id: &'a str,
    pub user_ip: &'a str,
    pub merchant_oid: &'a str,
    pub email: &'a str,
    pub payment_amount: i64,
    pub paytr_token: String,
    pub user_basket: String,
    pub debug_on: u8,
    pub no_installment: u8,
    pub max_installment: u8,
    pub user_name: &'a str,
    pub user_address: &'a str,
    pub user_phone: &'a str,
    pub merchant_ok_url: &'a str,
    pub merchant_fail_url: &'a str,
    pub timeout_limit: u32,
    pub currency: &'a str,
    pub test_mode: u8,
    pub lang: &'a str,
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub status: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Form body of the server-to-server payment notification.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackForm {
    pub merchant_oid: String,
    pub status: String,
    pub total_amount: String,
    pub hash: String,
    #[serde(default)]
    pub payment_tx_id: Option<String>,
    #[serde(default)]
    pub failed_reason_code: Option<String>,
    #[serde(default)]
    pub failed_reason_msg: Option<String>,
}

impl CallbackForm {
    /// Whether PayTR reports the payment as captured.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Convert a currency amount to minor units, rounding half away from zero.
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(Decimal::from(240)), Some(24_000));
        assert_eq!(to_minor_units(Decimal::new(1999, 2)), Some(1999));
        assert_eq!(to_minor_units(Decimal::new(10_005, 3)), Some(1001));
    }

    #[test]
    fn test_basket_line_json() {
        let basket = vec![BasketLine::new("Green Tea", Decimal::from(80), 3)];
        let json = serde_json::to_string(&basket).unwrap();
        assert_eq!(json, r#"[["Green Tea","80.00",3]]"#);
    }

    #[test]
    fn test_callback_form_parses_without_optional_fields() {
        let form: CallbackForm = serde_json::from_value(serde_json::json!({
            "merchant_oid": "17",
            "status": "failed",
            "total_amount": "24000",
            "hash": "abc"
        }))
        .unwrap();
        assert!(!form.is_success());
        assert_eq!(form.payment_tx_id, None);
    }
}
