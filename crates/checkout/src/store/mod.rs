//! Storage seams for the checkout engine.
//!
//! Services are generic over these traits so the same order and payment
//! logic runs against `PostgreSQL` ([`crate::db::PgStore`]) in production
//! and against [`MemoryStore`] in tests.
//!
//! Every mutating method is a single atomic step at the storage layer:
//! stock reservation, usage recording and both status columns are
//! compare-and-set updates, never read-modify-write sequences in the caller.

mod memory;

use std::future::Future;

use tierstore_core::campaign::Campaign;
use tierstore_core::{
    CampaignId, NewOrder, Order, OrderId, OrderStatus, PaymentStatus, Product, ProductId, UserId,
    UserIdentity,
};

pub use memory::MemoryStore;

use crate::db::RepositoryError;

/// Result of trying to record one campaign redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageOutcome {
    Recorded,
    /// The campaign's total cap was reached first.
    TotalExhausted,
    /// This user already redeemed it the maximum number of times.
    PerUserExhausted,
}

/// Products and their stock.
pub trait CatalogStore: Send + Sync {
    /// Load a product.
    fn product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Subtract `quantity` from stock if at least that much remains.
    ///
    /// Returns `false` without changing anything when stock is short or the
    /// product does not exist.
    fn reserve_stock(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Return previously reserved units to stock.
    fn release_stock(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Order persistence.
pub trait OrderStore: Send + Sync {
    /// Persist a new order as `pending`/`unpaid`.
    fn insert_order(
        &self,
        order: NewOrder,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    /// Load an order.
    fn order(&self, id: OrderId)
    -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Move `status` from `from` to `to`; `false` if the current status is
    /// no longer `from`.
    fn compare_and_set_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Record a gateway token while the order is still unpaid.
    fn set_payment_token(
        &self,
        id: OrderId,
        provider: &str,
        token: &str,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Move `payment_status` from `unpaid` to `outcome`.
    ///
    /// On `paid`, a `pending` order also becomes `confirmed` and the
    /// transaction id is recorded. Returns `false` if the order was not
    /// unpaid, in which case nothing changes.
    fn settle_payment(
        &self,
        id: OrderId,
        outcome: PaymentStatus,
        transaction_id: Option<&str>,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// Campaign definitions and redemption counts.
pub trait CampaignStore: Send + Sync {
    /// Load a campaign.
    fn campaign(
        &self,
        id: CampaignId,
    ) -> impl Future<Output = Result<Option<Campaign>, RepositoryError>> + Send;

    /// Count one redemption by `user`, honouring both usage limits.
    fn record_usage(
        &self,
        id: CampaignId,
        user: UserId,
    ) -> impl Future<Output = Result<UsageOutcome, RepositoryError>> + Send;

    /// Undo one redemption recorded by [`CampaignStore::record_usage`].
    fn release_usage(
        &self,
        id: CampaignId,
        user: UserId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Identity lookup for authenticated sessions.
pub trait UserDirectory: Send + Sync {
    /// Load the current identity of a user.
    fn identity(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<UserIdentity>, RepositoryError>> + Send;
}

/// Everything the checkout service needs from storage.
pub trait CheckoutStore:
    CatalogStore + OrderStore + CampaignStore + UserDirectory + Clone + 'static
{
    /// Cheap connectivity check for readiness probes.
    fn ping(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
