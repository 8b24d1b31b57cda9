//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before responding; their details never reach the
//! client.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tierstore_core::PricingError;

use crate::db::RepositoryError;
use crate::services::campaigns::CampaignError;
use crate::services::orders::OrderError;
use crate::services::payments::PaymentError;

/// Application-level error type for the checkout service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Campaign error: {0}")]
    Campaign(#[from] CampaignError),

    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized")]
    Unauthorized,

    /// User is authenticated but not allowed.
    #[error("Forbidden")]
    Forbidden,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Order(err) => match err {
                OrderError::Validation { .. } | OrderError::Pricing(_) => StatusCode::BAD_REQUEST,
                OrderError::ProductNotFound(_)
                | OrderError::CampaignNotFound(_)
                | OrderError::NotFound(_) => StatusCode::NOT_FOUND,
                OrderError::InsufficientStock(_)
                | OrderError::CampaignRejected(_)
                | OrderError::InvalidTransition { .. } => StatusCode::CONFLICT,
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Payment(err) => match err {
                PaymentError::NotConfigured | PaymentError::GatewayUnavailable(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                PaymentError::GatewayRejected(_) => StatusCode::BAD_GATEWAY,
                PaymentError::NotFound(_) => StatusCode::NOT_FOUND,
                PaymentError::Forbidden(_) => StatusCode::FORBIDDEN,
                PaymentError::OrderNotPayable(_) | PaymentError::AlreadyFinalized(_) => {
                    StatusCode::CONFLICT
                }
                PaymentError::SignatureMismatch | PaymentError::InvalidOutcome => {
                    StatusCode::BAD_REQUEST
                }
                PaymentError::Internal(_) | PaymentError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Campaign(err) => match err {
                CampaignError::OutOfRange(_) => StatusCode::BAD_REQUEST,
                CampaignError::NotFound(_) => StatusCode::NOT_FOUND,
                CampaignError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Pricing(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    /// Whether this error should be reported to Sentry.
    const fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Order(OrderError::Repository(_))
                | Self::Campaign(CampaignError::Repository(_))
                | Self::Payment(
                    PaymentError::Repository(_)
                        | PaymentError::Internal(_)
                        | PaymentError::GatewayUnavailable(_)
                        | PaymentError::GatewayRejected(_)
                )
        )
    }

    fn body(&self) -> serde_json::Value {
        match self {
            Self::Order(OrderError::Validation { field, message }) => {
                json!({ "error": format!("Invalid {field}: {message}"), "field": field })
            }
            Self::Campaign(CampaignError::OutOfRange(field)) => {
                json!({ "error": self.client_message(), "field": field })
            }
            Self::Order(OrderError::Pricing(err)) | Self::Pricing(err) => {
                json!({ "error": err.to_string(), "field": "dealerTier" })
            }
            Self::Order(
                OrderError::InsufficientStock(product_id)
                | OrderError::ProductNotFound(product_id),
            ) => json!({ "error": self.client_message(), "productId": product_id }),
            Self::Order(OrderError::CampaignRejected(reason)) => {
                json!({ "error": "Campaign rejected", "reason": reason.to_string() })
            }
            _ => json!({ "error": self.client_message() }),
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Order(OrderError::Repository(_))
            | Self::Campaign(CampaignError::Repository(_))
            | Self::Payment(PaymentError::Repository(_) | PaymentError::Internal(_)) => {
                "Internal server error".to_string()
            }
            Self::Payment(PaymentError::GatewayUnavailable(_)) => {
                "Payment provider unavailable, please retry".to_string()
            }
            Self::Payment(PaymentError::GatewayRejected(_)) => {
                "Payment provider rejected the request".to_string()
            }
            Self::Order(err) => err.to_string(),
            Self::Payment(err) => err.to_string(),
            Self::Campaign(err) => err.to_string(),
            Self::Pricing(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_reportable() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
pub fn set_sentry_user(user_id: &impl ToString, user_type: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            other: std::iter::once((
                "user_type".to_string(),
                serde_json::Value::String(user_type.to_string()),
            ))
            .collect(),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tierstore_core::{OrderId, OrderStatus, ProductId};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(get_status(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(OrderError::InsufficientStock(ProductId::new(1)).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                OrderError::InvalidTransition {
                    from: OrderStatus::Shipped,
                    to: OrderStatus::Pending,
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(PaymentError::GatewayUnavailable("timeout".to_string()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(PaymentError::NotConfigured.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(PaymentError::GatewayRejected("bad".to_string()).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(PaymentError::AlreadyFinalized(OrderId::new(1)).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(PricingError::MissingDealerTier.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "orders.status = 'bogus'".to_string(),
        ));
        assert_eq!(err.body(), json!({ "error": "Internal server error" }));

        let err = AppError::from(PaymentError::GatewayUnavailable(
            "connect 10.0.0.3:443 refused".to_string(),
        ));
        assert!(!err.body().to_string().contains("10.0.0.3"));
    }

    #[test]
    fn test_body_names_field_and_product() {
        let err = AppError::from(OrderError::Validation {
            field: "shippingAddress.city",
            message: "missing or invalid",
        });
        assert_eq!(err.body()["field"], "shippingAddress.city");

        let err = AppError::from(OrderError::InsufficientStock(ProductId::new(42)));
        assert_eq!(err.body()["productId"], 42);

        let err = AppError::from(OrderError::Pricing(PricingError::MissingDealerTier));
        assert_eq!(err.body()["field"], "dealerTier");

        let err = AppError::from(CampaignError::OutOfRange("cart.total"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body()["field"], "cart.total");
    }
}
