//! In-process store backing tests and local demos.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tierstore_core::campaign::Campaign;
use tierstore_core::{
    CampaignId, NewOrder, Order, OrderId, OrderStatus, PaymentStatus, Product, ProductId, UserId,
    UserIdentity,
};

use super::{
    CampaignStore, CatalogStore, CheckoutStore, OrderStore, UsageOutcome, UserDirectory,
};
use crate::db::RepositoryError;

#[derive(Debug, Default)]
struct State {
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    campaigns: BTreeMap<CampaignId, Campaign>,
    usages: HashMap<(CampaignId, UserId), u32>,
    users: BTreeMap<UserId, UserIdentity>,
    next_order_id: i32,
    fail_order_inserts: bool,
}

/// Store holding everything behind one mutex.
///
/// Each trait method takes the lock once, so every mutation is atomic with
/// respect to concurrent requests. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace a product.
    pub fn insert_product(&self, product: Product) {
        self.lock().products.insert(product.id, product);
    }

    /// Add or replace a campaign.
    pub fn insert_campaign(&self, campaign: Campaign) {
        self.lock().campaigns.insert(campaign.id, campaign);
    }

    /// Add or replace a user.
    pub fn insert_user(&self, identity: UserIdentity) {
        self.lock().users.insert(identity.id, identity);
    }

    /// Current stock of a product.
    #[must_use]
    pub fn stock(&self, id: ProductId) -> Option<u32> {
        self.lock().products.get(&id).map(|p| p.stock)
    }

    /// Current redemption count of a campaign.
    #[must_use]
    pub fn campaign_usage(&self, id: CampaignId) -> Option<u32> {
        self.lock()
            .campaigns
            .get(&id)
            .map(|c| c.usage_limit.current_usage)
    }

    /// Number of stored orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    /// Make subsequent order inserts fail with a storage error.
    pub fn fail_order_inserts(&self, fail: bool) {
        self.lock().fail_order_inserts = fail;
    }
}

impl CatalogStore for MemoryStore {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.lock().products.get(&id).cloned())
    }

    async fn reserve_stock(&self, id: ProductId, quantity: u32) -> Result<bool, RepositoryError> {
        let mut state = self.lock();
        match state.products.get_mut(&id) {
            Some(product) if product.stock >= quantity => {
                product.stock -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_stock(&self, id: ProductId, quantity: u32) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        let product = state
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        product.stock = product.stock.saturating_add(quantity);
        Ok(())
    }
}

impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut state = self.lock();
        if state.fail_order_inserts {
            return Err(RepositoryError::Conflict("order inserts disabled".to_string()));
        }

        state.next_order_id += 1;
        let now = Utc::now();
        let stored = Order {
            id: OrderId::new(state.next_order_id),
            user_id: order.user_id,
            user_type: order.user_type,
            items: order.items,
            total_amount: order.total_amount,
            discount_amount: order.discount_amount,
            free_shipping: order.free_shipping,
            campaign_id: order.campaign_id,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_provider: None,
            payment_token: None,
            payment_transaction_id: None,
            shipping_address: order.shipping_address,
            notes: order.notes,
            created_at: now,
            updated_at: now,
        };
        state.orders.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.lock().orders.get(&id).cloned())
    }

    async fn compare_and_set_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock();
        match state.orders.get_mut(&id) {
            Some(order) if order.status == from => {
                order.status = to;
                order.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_payment_token(
        &self,
        id: OrderId,
        provider: &str,
        token: &str,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock();
        match state.orders.get_mut(&id) {
            Some(order) if order.payment_status == PaymentStatus::Unpaid => {
                order.payment_provider = Some(provider.to_string());
                order.payment_token = Some(token.to_string());
                order.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn settle_payment(
        &self,
        id: OrderId,
        outcome: PaymentStatus,
        transaction_id: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock();
        match state.orders.get_mut(&id) {
            Some(order) if order.payment_status == PaymentStatus::Unpaid => {
                order.payment_status = outcome;
                if outcome == PaymentStatus::Paid {
                    if order.status == OrderStatus::Pending {
                        order.status = OrderStatus::Confirmed;
                    }
                    if let Some(tx) = transaction_id {
                        order.payment_transaction_id = Some(tx.to_string());
                    }
                }
                order.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl CampaignStore for MemoryStore {
    async fn campaign(&self, id: CampaignId) -> Result<Option<Campaign>, RepositoryError> {
        Ok(self.lock().campaigns.get(&id).cloned())
    }

    async fn record_usage(
        &self,
        id: CampaignId,
        user: UserId,
    ) -> Result<UsageOutcome, RepositoryError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let used_by_user = state.usages.get(&(id, user)).copied().unwrap_or(0);
        let campaign = state
            .campaigns
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;

        if campaign.usage_limit.is_exhausted() {
            return Ok(UsageOutcome::TotalExhausted);
        }
        if campaign
            .usage_limit
            .per_user
            .is_some_and(|limit| used_by_user >= limit)
        {
            return Ok(UsageOutcome::PerUserExhausted);
        }

        campaign.usage_limit.current_usage += 1;
        state.usages.insert((id, user), used_by_user + 1);
        Ok(UsageOutcome::Recorded)
    }

    async fn release_usage(&self, id: CampaignId, user: UserId) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        if let Some(count) = state.usages.get_mut(&(id, user)) {
            *count = count.saturating_sub(1);
        }
        if let Some(campaign) = state.campaigns.get_mut(&id) {
            campaign.usage_limit.current_usage =
                campaign.usage_limit.current_usage.saturating_sub(1);
        }
        Ok(())
    }
}

impl UserDirectory for MemoryStore {
    async fn identity(&self, id: UserId) -> Result<Option<UserIdentity>, RepositoryError> {
        Ok(self.lock().users.get(&id).copied())
    }
}

impl CheckoutStore for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
