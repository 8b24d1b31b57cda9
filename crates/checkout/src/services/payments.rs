//! Payment token issuance, callback handling and manual overrides.

use serde::Serialize;
use thiserror::Error;
use tierstore_core::{Order, OrderId, OrderStatus, PaymentStatus, UserIdentity};
use tracing::{info, instrument, warn};

use crate::db::RepositoryError;
use crate::paytr::{BasketLine, CallbackForm, PaymentRequest, PaytrClient, PaytrError, to_minor_units};
use crate::store::OrderStore;

/// Provider name stored on orders paid through PayTR.
pub const PROVIDER_PAYTR: &str = "paytr";

/// Errors from the payment flow.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payments are not configured")]
    NotConfigured,

    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error("order {0} belongs to another user")]
    Forbidden(OrderId),

    #[error("order {0} cannot be paid")]
    OrderNotPayable(OrderId),

    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("payment gateway rejected the request: {0}")]
    GatewayRejected(String),

    #[error("callback signature mismatch")]
    SignatureMismatch,

    #[error("payment for order {0} is already final")]
    AlreadyFinalized(OrderId),

    #[error("payment status must be paid or failed")]
    InvalidOutcome,

    #[error("payment error: {0}")]
    Internal(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<PaytrError> for PaymentError {
    fn from(err: PaytrError) -> Self {
        if err.is_retryable() {
            return Self::GatewayUnavailable(err.to_string());
        }
        match err {
            PaytrError::Rejected(reason) => Self::GatewayRejected(reason),
            PaytrError::SignatureMismatch => Self::SignatureMismatch,
            PaytrError::Encoding(msg) => Self::Internal(msg),
            other => Self::GatewayUnavailable(other.to_string()),
        }
    }
}

/// A freshly issued hosted-page token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub checkout_url: String,
}

/// What a verified callback did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The order moved out of `unpaid`.
    Settled(PaymentStatus),
    /// The order was already final; nothing changed.
    Replayed,
    /// The callback referenced no known order.
    UnknownOrder,
}

/// Payment operations over an [`OrderStore`] and an optional gateway.
pub struct PaymentService<'a, S> {
    store: &'a S,
    gateway: Option<&'a PaytrClient>,
}

impl<'a, S: OrderStore> PaymentService<'a, S> {
    /// Create a service. A `None` gateway disables token issuance and
    /// callback verification.
    #[must_use]
    pub const fn new(store: &'a S, gateway: Option<&'a PaytrClient>) -> Self {
        Self { store, gateway }
    }

    fn gateway(&self) -> Result<&'a PaytrClient, PaymentError> {
        self.gateway.ok_or(PaymentError::NotConfigured)
    }

    /// Mint a PayTR token for an unpaid order owned by `requester`.
    ///
    /// # Errors
    ///
    /// Never mutates the order on failure. Gateway problems surface as
    /// [`PaymentError::GatewayUnavailable`] (retryable) or
    /// [`PaymentError::GatewayRejected`].
    #[instrument(skip(self, requester, user_ip), fields(user_id = %requester.id))]
    pub async fn create_token(
        &self,
        order_id: OrderId,
        requester: &UserIdentity,
        user_ip: &str,
    ) -> Result<IssuedToken, PaymentError> {
        let gateway = self.gateway()?;
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(PaymentError::NotFound(order_id))?;

        if order.user_id != requester.id {
            return Err(PaymentError::Forbidden(order_id));
        }
        if !order.is_payable() {
            return Err(PaymentError::OrderNotPayable(order_id));
        }

        let request = payment_request(&order, user_ip)?;
        let token = gateway.request_token(&request).await.map_err(|e| {
            warn!(order_id = %order_id, error = %e, "Token request failed");
            PaymentError::from(e)
        })?;

        if !self
            .store
            .set_payment_token(order_id, PROVIDER_PAYTR, &token)
            .await?
        {
            return Err(PaymentError::OrderNotPayable(order_id));
        }

        info!(order_id = %order_id, amount = request.payment_amount, "Payment token issued");
        Ok(IssuedToken {
            checkout_url: gateway.config().checkout_url(&token),
            token,
        })
    }

    /// Verify and apply a PayTR callback.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::SignatureMismatch`] for forged or altered
    /// callbacks; nothing is changed in that case.
    #[instrument(skip(self, callback), fields(merchant_oid = %callback.merchant_oid, status = %callback.status))]
    pub async fn handle_callback(
        &self,
        callback: &CallbackForm,
    ) -> Result<CallbackOutcome, PaymentError> {
        let gateway = self.gateway()?;
        if gateway.verify_callback(callback).is_err() {
            warn!(
                security_event = "paytr_signature_mismatch",
                "Rejected PayTR callback with invalid signature"
            );
            return Err(PaymentError::SignatureMismatch);
        }

        let Ok(order_id) = callback.merchant_oid.parse::<OrderId>() else {
            warn!("Signed callback for unparseable merchant_oid");
            return Ok(CallbackOutcome::UnknownOrder);
        };
        let Some(order) = self.store.order(order_id).await? else {
            warn!(order_id = %order_id, "Signed callback for unknown order");
            return Ok(CallbackOutcome::UnknownOrder);
        };

        let expected = to_minor_units(order.payable_amount());
        if callback.total_amount.trim().parse::<i64>().ok() != expected {
            warn!(
                order_id = %order_id,
                reported = %callback.total_amount,
                expected = ?expected,
                "Callback amount differs from payable amount"
            );
        }

        let outcome = if callback.is_success() {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Failed
        };

        if self
            .store
            .settle_payment(order_id, outcome, callback.payment_tx_id.as_deref())
            .await?
        {
            if outcome == PaymentStatus::Failed {
                info!(
                    order_id = %order_id,
                    reason_code = ?callback.failed_reason_code,
                    reason = ?callback.failed_reason_msg,
                    "Payment failed"
                );
            } else if refund_needed(order.status, outcome) {
                warn!(
                    order_id = %order_id,
                    transaction_id = ?callback.payment_tx_id,
                    alert = "paid_on_cancelled_order",
                    "Payment captured on a cancelled order; refund needed"
                );
            } else {
                info!(order_id = %order_id, "Payment captured");
            }
            Ok(CallbackOutcome::Settled(outcome))
        } else {
            info!(order_id = %order_id, "Callback replay ignored; payment already final");
            Ok(CallbackOutcome::Replayed)
        }
    }

    /// Settle a payment by hand, e.g. after a bank transfer.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::AlreadyFinalized`] if the order is not unpaid.
    #[instrument(skip(self))]
    pub async fn override_payment(
        &self,
        order_id: OrderId,
        outcome: PaymentStatus,
        transaction_id: Option<&str>,
    ) -> Result<Order, PaymentError> {
        if !outcome.is_final() {
            return Err(PaymentError::InvalidOutcome);
        }
        if self.store.order(order_id).await?.is_none() {
            return Err(PaymentError::NotFound(order_id));
        }

        if !self
            .store
            .settle_payment(order_id, outcome, transaction_id)
            .await?
        {
            return Err(PaymentError::AlreadyFinalized(order_id));
        }

        info!(order_id = %order_id, %outcome, "Payment status overridden");
        self.store
            .order(order_id)
            .await?
            .ok_or(PaymentError::NotFound(order_id))
    }
}

/// Build the gateway request for an order.
/// A capture that lands on an order whose stock was already released.
const fn refund_needed(status: OrderStatus, outcome: PaymentStatus) -> bool {
    matches!(
        (status, outcome),
        (OrderStatus::Cancelled, PaymentStatus::Paid)
    )
}

fn payment_request(order: &Order, user_ip: &str) -> Result<PaymentRequest, PaymentError> {
    let payment_amount = to_minor_units(order.payable_amount())
        .ok_or_else(|| PaymentError::Internal("payable amount out of range".to_string()))?;
    if payment_amount <= 0 {
        return Err(PaymentError::OrderNotPayable(order.id));
    }

    let address = &order.shipping_address;
    Ok(PaymentRequest {
        user_ip: user_ip.to_string(),
        merchant_oid: order.id.to_string(),
        email: address.email.as_str().to_string(),
        payment_amount,
        basket: order
            .items
            .iter()
            .map(|item| BasketLine::new(&item.name, item.price, item.quantity))
            .collect(),
        user_name: address.full_name.clone(),
        user_address: address.one_line(),
        user_phone: address.phone.clone(),
    })
}

impl std::fmt::Display for CallbackOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Settled(status) => write!(f, "settled as {status}"),
            Self::Replayed => f.write_str("replayed"),
            Self::UnknownOrder => f.write_str("unknown order"),
        }
    }
}
