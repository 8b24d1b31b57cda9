//! PayTR iFrame API client.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use secrecy::ExposeSecret;
use tracing::{debug, instrument, warn};

use super::error::PaytrError;
use super::signature::{self, TokenHashInput};
use super::types::{CallbackForm, PaymentRequest, TokenForm, TokenResponse};
use crate::config::PaytrConfig;

/// Client for minting payment tokens and verifying callbacks.
///
/// Holds the merchant credentials it was constructed with; nothing is read
/// from the environment after construction.
#[derive(Clone)]
pub struct PaytrClient {
    client: Client,
    config: PaytrConfig,
}

impl std::fmt::Debug for PaytrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaytrClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PaytrClient {
    /// Create a client whose requests time out after
    /// [`PaytrConfig::request_timeout`].
    ///
    /// # Errors
    ///
    /// Returns [`PaytrError::Encoding`] if the HTTP client cannot be built.
    pub fn new(config: PaytrConfig) -> Result<Self, PaytrError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PaytrError::Encoding(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// The merchant configuration.
    #[must_use]
    pub const fn config(&self) -> &PaytrConfig {
        &self.config
    }

    /// Request a hosted-page token for one order.
    ///
    /// # Errors
    ///
    /// Returns a retryable error for network failures, 5xx responses and
    /// unreadable bodies, and [`PaytrError::Rejected`] when PayTR declines.
    #[instrument(skip(self, request), fields(merchant_oid = %request.merchant_oid))]
    pub async fn request_token(&self, request: &PaymentRequest) -> Result<String, PaytrError> {
        let basket_json = serde_json::to_string(&request.basket)
            .map_err(|e| PaytrError::Encoding(e.to_string()))?;
        let user_basket = STANDARD.encode(basket_json);

        let no_installment = u8::from(self.config.no_installment);
        let test_mode = u8::from(self.config.test_mode);
        let paytr_token = signature::token_signature(
            self.config.merchant_key.expose_secret().as_bytes(),
            self.config.merchant_salt.expose_secret(),
            &TokenHashInput {
                merchant_id: &self.config.merchant_id,
                user_ip: &request.user_ip,
                merchant_oid: &request.merchant_oid,
                email: &request.email,
                payment_amount: request.payment_amount,
                user_basket: &user_basket,
                no_installment,
                max_installment: self.config.max_installment,
                currency: &self.config.currency,
                test_mode,
            },
        )?;

        let form = TokenForm {
            merchant_id: &self.config.merchant_id,
            user_ip: &request.user_ip,
            merchant_oid: &request.merchant_oid,
            email: &request.email,
            payment_amount: request.payment_amount,
            paytr_token,
            user_basket,
            debug_on: u8::from(self.config.debug),
            no_installment,
            max_installment: self.config.max_installment,
            user_name: &request.user_name,
            user_address: &request.user_address,
            user_phone: &request.user_phone,
            merchant_ok_url: &self.config.ok_url,
            merchant_fail_url: &self.config.fail_url,
            timeout_limit: self.config.timeout_limit,
            currency: &self.config.currency,
            test_mode,
            lang: &self.config.lang,
        };

        let response = self
            .client
            .post(self.config.token_endpoint())
            .form(&form)
            .send()
            .await
            .map_err(|e| PaytrError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), "PayTR token endpoint server error");
            return Err(PaytrError::ServerError(status.as_u16()));
        }
        if !status.is_success() {
            return Err(PaytrError::Rejected(format!("HTTP {}", status.as_u16())));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| PaytrError::Response(e.to_string()))?;

        if body.status != "success" {
            let reason = body.reason.unwrap_or(body.status);
            warn!(reason = %reason, "PayTR declined token request");
            return Err(PaytrError::Rejected(reason));
        }

        let token = body
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PaytrError::Response("success without token".to_string()))?;

        debug!("PayTR token issued");
        Ok(token)
    }

    /// Verify the hash on an inbound callback.
    ///
    /// # Errors
    ///
    /// Returns [`PaytrError::SignatureMismatch`] if any signed field was
    /// altered or the hash was made with other credentials.
    pub fn verify_callback(&self, callback: &CallbackForm) -> Result<(), PaytrError> {
        signature::verify_callback(
            self.config.merchant_key.expose_secret().as_bytes(),
            self.config.merchant_salt.expose_secret(),
            &callback.merchant_oid,
            &callback.status,
            &callback.total_amount,
            &callback.hash,
        )
    }

    /// Sign a callback the way PayTR does. Used by tests and local tooling.
    ///
    /// # Errors
    ///
    /// Returns [`PaytrError::Encoding`] if the key is rejected by the MAC.
    pub fn sign_callback(
        &self,
        merchant_oid: &str,
        status: &str,
        total_amount: &str,
    ) -> Result<String, PaytrError> {
        signature::callback_signature(
            self.config.merchant_key.expose_secret().as_bytes(),
            self.config.merchant_salt.expose_secret(),
            merchant_oid,
            status,
            total_amount,
        )
    }
}
