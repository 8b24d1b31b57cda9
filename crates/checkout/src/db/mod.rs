//! Database operations for checkout `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users` - identity and dealer tier, written by the auth service
//! - `products` - price table, visibility flags and stock
//! - `orders` - immutable order snapshots plus status columns
//! - `campaigns` - campaign definitions and redemption counters
//! - `campaign_usages` - one row per redemption, for per-user limits
//! - `tower_sessions.session` - session storage
//!
//! Order items, shipping address, campaign audience and campaign rule are
//! JSONB documents. Queries are runtime-checked so the crate builds without
//! a live database.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/checkout/migrations/` and run via:
//! ```bash
//! cargo run -p tierstore-cli -- migrate
//! ```

mod campaigns;
mod orders;
mod products;
mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tierstore_core::campaign::Campaign;
use tierstore_core::{
    CampaignId, NewOrder, Order, OrderId, OrderStatus, PaymentStatus, Product, ProductId, UserId,
    UserIdentity,
};

pub use campaigns::CampaignRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

use crate::store::{
    CampaignStore, CatalogStore, CheckoutStore, OrderStore, UsageOutcome, UserDirectory,
};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate SKU).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Convert a stored non-negative integer, flagging negative values.
fn to_u32(value: i32, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative {column}: {value}")))
}

/// Convert a count for binding into an `INTEGER` column.
fn to_i32(value: u32, column: &str) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::Conflict(format!("{column} out of range: {value}")))
}

/// [`CheckoutStore`] backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl CatalogStore for PgStore {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get_by_id(id).await
    }

    async fn reserve_stock(&self, id: ProductId, quantity: u32) -> Result<bool, RepositoryError> {
        ProductRepository::new(&self.pool)
            .reserve_stock(id, quantity)
            .await
    }

    async fn release_stock(&self, id: ProductId, quantity: u32) -> Result<(), RepositoryError> {
        ProductRepository::new(&self.pool)
            .release_stock(id, quantity)
            .await
    }
}

impl OrderStore for PgStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        OrderRepository::new(&self.pool).create(&order).await
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).get_by_id(id).await
    }

    async fn compare_and_set_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        OrderRepository::new(&self.pool)
            .compare_and_set_status(id, from, to)
            .await
    }

    async fn set_payment_token(
        &self,
        id: OrderId,
        provider: &str,
        token: &str,
    ) -> Result<bool, RepositoryError> {
        OrderRepository::new(&self.pool)
            .set_payment_token(id, provider, token)
            .await
    }

    async fn settle_payment(
        &self,
        id: OrderId,
        outcome: PaymentStatus,
        transaction_id: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        OrderRepository::new(&self.pool)
            .settle_payment(id, outcome, transaction_id)
            .await
    }
}

impl CampaignStore for PgStore {
    async fn campaign(&self, id: CampaignId) -> Result<Option<Campaign>, RepositoryError> {
        CampaignRepository::new(&self.pool).get_by_id(id).await
    }

    async fn record_usage(
        &self,
        id: CampaignId,
        user: UserId,
    ) -> Result<UsageOutcome, RepositoryError> {
        CampaignRepository::new(&self.pool)
            .record_usage(id, user)
            .await
    }

    async fn release_usage(&self, id: CampaignId, user: UserId) -> Result<(), RepositoryError> {
        CampaignRepository::new(&self.pool)
            .release_usage(id, user)
            .await
    }
}

impl UserDirectory for PgStore {
    async fn identity(&self, id: UserId) -> Result<Option<UserIdentity>, RepositoryError> {
        UserRepository::new(&self.pool).get_identity(id).await
    }
}

impl CheckoutStore for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_counts_are_corruption() {
        assert_eq!(to_u32(5, "stock").ok(), Some(5));
        assert!(matches!(
            to_u32(-1, "stock"),
            Err(RepositoryError::DataCorruption(_))
        ));
        assert!(matches!(
            to_i32(u32::MAX, "quantity"),
            Err(RepositoryError::Conflict(_))
        ));
    }
}
