//! HMAC-SHA256 signatures for token requests and payment callbacks.
//!
//! Both directions use the merchant key as the HMAC key and append the
//! merchant salt to the signed string. Digests travel base64-encoded.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::error::PaytrError;

type HmacSha256 = Hmac<Sha256>;

/// The order-specific part of the token hash input.
#[derive(Debug, Clone, Copy)]
pub struct TokenHashInput<'a> {
    pub merchant_id: &'a str,
    pub user_ip: &'a str,
    pub merchant_oid: &'a str,
    pub email: &'a str,
    pub payment_amount: i64,
    pub user_basket: &'a str,
    pub no_installment: u8,
    pub max_installment: u8,
    pub currency: &'a str,
    pub test_mode: u8,
}

fn mac_for(key: &[u8]) -> Result<HmacSha256, PaytrError> {
    HmacSha256::new_from_slice(key).map_err(|e| PaytrError::Encoding(e.to_string()))
}

/// `paytr_token` for a token request.
///
/// # Errors
///
/// Returns [`PaytrError::Encoding`] if the key is rejected by the MAC.
pub fn token_signature(
    key: &[u8],
    salt: &str,
    input: &TokenHashInput<'_>,
) -> Result<String, PaytrError> {
    let data = format!(
        "{}{}{}{}{}{}{}{}{}{}{salt}",
        input.merchant_id,
        input.user_ip,
        input.merchant_oid,
        input.email,
        input.payment_amount,
        input.user_basket,
        input.no_installment,
        input.max_installment,
        input.currency,
        input.test_mode,
    );

    let mut mac = mac_for(key)?;
    mac.update(data.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Expected `hash` of a callback.
///
/// # Errors
///
/// Returns [`PaytrError::Encoding`] if the key is rejected by the MAC.
pub fn callback_signature(
    key: &[u8],
    salt: &str,
    merchant_oid: &str,
    status: &str,
    total_amount: &str,
) -> Result<String, PaytrError> {
    let mut mac = mac_for(key)?;
    mac.update(format!("{merchant_oid}{salt}{status}{total_amount}").as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Check a callback hash in constant time.
///
/// # Errors
///
/// Returns [`PaytrError::SignatureMismatch`] when the hash is not valid
/// base64 or does not match.
pub fn verify_callback(
    key: &[u8],
    salt: &str,
    merchant_oid: &str,
    status: &str,
    total_amount: &str,
    hash: &str,
) -> Result<(), PaytrError> {
    let provided = STANDARD
        .decode(hash.trim())
        .map_err(|_| PaytrError::SignatureMismatch)?;

    let mut mac = mac_for(key)?;
    mac.update(format!("{merchant_oid}{salt}{status}{total_amount}").as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| PaytrError::SignatureMismatch)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"kQ7vX2pL9mZ4tR8w";
    const SALT: &str = "Hn3Jd8Ks5Lq1Wc6b";

    fn signed() -> String {
        callback_signature(KEY, SALT, "17", "success", "24000").unwrap()
    }

    #[test]
    fn test_callback_signature_known_answer() {
        assert_eq!(signed(), "iNAqbBoLgdnyNC+9KKHYL4vqFcT1XnHkugQ87LPJEh0=");
    }

    #[test]
    fn test_valid_callback_verifies() {
        assert!(verify_callback(KEY, SALT, "17", "success", "24000", &signed()).is_ok());
    }

    #[test]
    fn test_tampered_fields_fail() {
        let hash = signed();
        let tampered = [
            ("18", "success", "24000"),
            ("17", "failed", "24000"),
            ("17", "success", "1"),
        ];
        for (oid, status, amount) in tampered {
            assert!(matches!(
                verify_callback(KEY, SALT, oid, status, amount, &hash),
                Err(PaytrError::SignatureMismatch)
            ));
        }
    }

    #[test]
    fn test_wrong_key_or_salt_fails() {
        let hash = signed();
        assert!(verify_callback(b"other-key-value1", SALT, "17", "success", "24000", &hash).is_err());
        assert!(verify_callback(KEY, "other-salt-val", "17", "success", "24000", &hash).is_err());
    }

    #[test]
    fn test_garbage_hash_is_mismatch() {
        assert!(matches!(
            verify_callback(KEY, SALT, "17", "success", "24000", "not base64 !!"),
            Err(PaytrError::SignatureMismatch)
        ));
        assert!(matches!(
            verify_callback(KEY, SALT, "17", "success", "24000", ""),
            Err(PaytrError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_token_signature_known_answer() {
        let input = TokenHashInput {
            merchant_id: "100001",
            user_ip: "203.0.113.7",
            merchant_oid: "17",
            email: "ayse@example.com",
            payment_amount: 24_000,
            user_basket: "W1siVGVhIiwiODAuMDAiLDNdXQ==",
            no_installment: 0,
            max_installment: 0,
            currency: "TL",
            test_mode: 1,
        };
        let base = token_signature(KEY, SALT, &input).unwrap();
        assert_eq!(base, "TynVQLFwdC/ZbbnHMoKkaZj+/FxxWO0OgA1U3uK0/eE=");

        let changed = TokenHashInput {
            payment_amount: 24_001,
            ..input
        };
        assert_ne!(base, token_signature(KEY, SALT, &changed).unwrap());
        assert_ne!(base, token_signature(KEY, "different-salt", &input).unwrap());
    }
}
