//! Order assembly and status administration.
//!
//! Orders are always priced from the catalog; the client only names products
//! and quantities. Stock is reserved line by line with conditional updates,
//! and every reservation made during a failed attempt is released before the
//! error is returned.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tierstore_core::campaign::{
    CampaignType, CartSnapshot, CartSnapshotLine, EvaluationOutcome, Rejection, evaluate,
};
use tierstore_core::{
    CampaignId, NewOrder, Order, OrderId, OrderItem, OrderStatus, PricingError, ProductId,
    ShippingAddress, UserIdentity, resolve_price, resolve_visibility,
};
use tracing::{error, info, instrument, warn};

use crate::db::RepositoryError;
use crate::store::{CheckoutStore, UsageOutcome};

/// Most lines accepted in one order.
pub const MAX_ORDER_LINES: usize = 100;

/// Longest accepted order note, in characters.
pub const MAX_NOTES_LENGTH: usize = 1000;

/// One requested line. Prices are never accepted from the client.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of an order placement request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub items: Vec<CartLine>,
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub campaign_id: Option<CampaignId>,
}

/// Why a campaign could not be attached to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CampaignRejection {
    #[error("{0}")]
    NotApplicable(Rejection),
    #[error("cart is {0} short of the campaign minimum")]
    BelowMinimum(Decimal),
    #[error("campaign usage limit reached")]
    UsageLimitReached,
    #[error("campaign already used the maximum number of times by this user")]
    PerUserLimitReached,
}

/// Errors from order placement and administration.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("insufficient stock for product {0}")]
    InsufficientStock(ProductId),

    #[error("campaign {0} not found")]
    CampaignNotFound(CampaignId),

    #[error("campaign rejected: {0}")]
    CampaignRejected(CampaignRejection),

    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl OrderError {
    const fn validation(field: &'static str, message: &'static str) -> Self {
        Self::Validation { field, message }
    }
}

/// Check a request before any stock is touched.
///
/// # Errors
///
/// Returns [`OrderError::Validation`] naming the first offending field.
pub fn validate_request(request: &OrderRequest) -> Result<(), OrderError> {
    if request.items.is_empty() {
        return Err(OrderError::validation("items", "at least one item is required"));
    }
    if request.items.len() > MAX_ORDER_LINES {
        return Err(OrderError::validation("items", "too many items"));
    }
    if request.items.iter().any(|line| line.quantity == 0) {
        return Err(OrderError::validation("items.quantity", "must be at least 1"));
    }
    request
        .shipping_address
        .validate()
        .map_err(|field| OrderError::validation(field, "missing or invalid"))?;
    if request
        .notes
        .as_ref()
        .is_some_and(|n| n.chars().count() > MAX_NOTES_LENGTH)
    {
        return Err(OrderError::validation("notes", "too long"));
    }
    Ok(())
}

/// Order placement and status changes over a [`CheckoutStore`].
pub struct OrderService<'a, S> {
    store: &'a S,
}

impl<'a, S: CheckoutStore> OrderService<'a, S> {
    /// Create a service over `store`.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Price, reserve and persist an order for `user`.
    ///
    /// # Errors
    ///
    /// Returns the first validation, catalog, stock, pricing or campaign
    /// failure. Stock and campaign usage are unchanged when an error is
    /// returned.
    #[instrument(skip(self, user, request, now), fields(user_id = %user.id, lines = request.items.len()))]
    pub async fn create_order(
        &self,
        user: &UserIdentity,
        request: OrderRequest,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        validate_request(&request)?;

        let mut reserved: Vec<(ProductId, u32)> = Vec::with_capacity(request.items.len());
        let priced = self.price_and_reserve(user, &request.items, &mut reserved).await;
        let (items, snapshot) = match priced {
            Ok(priced) => priced,
            Err(e) => {
                self.release_stock(&reserved).await;
                return Err(e);
            }
        };

        let total_amount: Decimal = items.iter().map(OrderItem::line_total).sum();

        let attached = match request.campaign_id {
            Some(campaign_id) => {
                match self
                    .attach_campaign(campaign_id, user, &snapshot, total_amount, now)
                    .await
                {
                    Ok(attached) => Some(attached),
                    Err(e) => {
                        self.release_stock(&reserved).await;
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        let new_order = NewOrder {
            user_id: user.id,
            user_type: user.user_type,
            items,
            total_amount,
            discount_amount: attached.map_or(Decimal::ZERO, |a| a.discount),
            free_shipping: attached.is_some_and(|a| a.free_shipping),
            campaign_id: attached.map(|a| a.campaign_id),
            shipping_address: request.shipping_address,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
        };

        match self.store.insert_order(new_order).await {
            Ok(order) => {
                info!(
                    order_id = %order.id,
                    total = %order.total_amount,
                    discount = %order.discount_amount,
                    "Order placed"
                );
                Ok(order)
            }
            Err(e) => {
                error!(error = %e, "Failed to persist order; rolling back");
                if let Some(attached) = attached {
                    if let Err(release) = self
                        .store
                        .release_usage(attached.campaign_id, user.id)
                        .await
                    {
                        error!(error = %release, "Failed to release campaign usage");
                    }
                }
                self.release_stock(&reserved).await;
                Err(e.into())
            }
        }
    }

    /// Walk the lines in submission order, pricing each and reserving its
    /// stock. Reservations made so far are pushed onto `reserved`.
    async fn price_and_reserve(
        &self,
        user: &UserIdentity,
        lines: &[CartLine],
        reserved: &mut Vec<(ProductId, u32)>,
    ) -> Result<(Vec<OrderItem>, CartSnapshot), OrderError> {
        let mut items = Vec::with_capacity(lines.len());
        let mut snapshot_lines = Vec::with_capacity(lines.len());

        for line in lines {
            let product = self
                .store
                .product(line.product_id)
                .await?
                .filter(|p| resolve_visibility(&p.visibility, Some(user)))
                .ok_or(OrderError::ProductNotFound(line.product_id))?;

            if product.stock < line.quantity {
                return Err(OrderError::InsufficientStock(product.id));
            }

            let price = resolve_price(&product.prices, Some(user))?;

            if !self.store.reserve_stock(product.id, line.quantity).await? {
                return Err(OrderError::InsufficientStock(product.id));
            }
            reserved.push((product.id, line.quantity));

            let item = OrderItem {
                product_id: product.id,
                name: product.name,
                sku: product.sku,
                quantity: line.quantity,
                price,
            };
            snapshot_lines.push(CartSnapshotLine {
                product_id: Some(product.id),
                category_id: product.category_id,
                subtotal: item.line_total(),
            });
            items.push(item);
        }

        let total = items.iter().map(OrderItem::line_total).sum();
        Ok((
            items,
            CartSnapshot {
                total,
                items: snapshot_lines,
            },
        ))
    }

    async fn attach_campaign(
        &self,
        campaign_id: CampaignId,
        user: &UserIdentity,
        snapshot: &CartSnapshot,
        total_amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<AttachedCampaign, OrderError> {
        let campaign = self
            .store
            .campaign(campaign_id)
            .await?
            .ok_or(OrderError::CampaignNotFound(campaign_id))?;

        let evaluation = match evaluate(&campaign, snapshot, Some(user), now) {
            EvaluationOutcome::Applied(evaluation) => evaluation,
            EvaluationOutcome::Rejected { reason } => {
                return Err(OrderError::CampaignRejected(
                    CampaignRejection::NotApplicable(reason),
                ));
            }
        };
        if let Some(shortfall) = evaluation.amount_to_qualify {
            return Err(OrderError::CampaignRejected(
                CampaignRejection::BelowMinimum(shortfall),
            ));
        }

        match self.store.record_usage(campaign_id, user.id).await? {
            UsageOutcome::Recorded => {}
            UsageOutcome::TotalExhausted => {
                return Err(OrderError::CampaignRejected(
                    CampaignRejection::UsageLimitReached,
                ));
            }
            UsageOutcome::PerUserExhausted => {
                return Err(OrderError::CampaignRejected(
                    CampaignRejection::PerUserLimitReached,
                ));
            }
        }

        let discount = if campaign.campaign_type() == CampaignType::BuyOneGetOne {
            Decimal::ZERO
        } else {
            evaluation.discount.min(total_amount)
        };

        Ok(AttachedCampaign {
            campaign_id,
            discount,
            free_shipping: evaluation.free_shipping,
        })
    }

    async fn release_stock(&self, reserved: &[(ProductId, u32)]) {
        for &(product_id, quantity) in reserved.iter().rev() {
            if let Err(e) = self.store.release_stock(product_id, quantity).await {
                error!(
                    product_id = %product_id,
                    quantity,
                    error = %e,
                    "Failed to release reserved stock"
                );
            }
        }
    }

    /// Load an order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotFound`] if no such order exists.
    pub async fn get(&self, id: OrderId) -> Result<Order, OrderError> {
        self.store
            .order(id)
            .await?
            .ok_or(OrderError::NotFound(id))
    }

    /// Move an order forward, or cancel it.
    ///
    /// Cancelling an order that has not shipped returns its units to stock.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidTransition`] for backward moves, moves
    /// out of `cancelled`, or when another request changed the status first.
    #[instrument(skip(self))]
    pub async fn advance_status(&self, id: OrderId, to: OrderStatus) -> Result<Order, OrderError> {
        let order = self.get(id).await?;
        let from = order.status;

        if !from.can_transition_to(to) {
            return Err(OrderError::InvalidTransition { from, to });
        }
        if !self.store.compare_and_set_status(id, from, to).await? {
            warn!(order_id = %id, %from, %to, "Order status changed concurrently");
            let current = self.get(id).await?.status;
            return Err(OrderError::InvalidTransition { from: current, to });
        }

        if to == OrderStatus::Cancelled && from.restocks_on_cancel() {
            let units: Vec<_> = order
                .items
                .iter()
                .map(|item| (item.product_id, item.quantity))
                .collect();
            self.release_stock(&units).await;
        }

        info!(order_id = %id, %from, %to, "Order status advanced");
        self.get(id).await
    }
}

#[derive(Debug, Clone, Copy)]
struct AttachedCampaign {
    campaign_id: CampaignId,
    discount: Decimal,
    free_shipping: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::TimeZone;
    use tierstore_core::campaign::{
        AudienceSegment, Campaign, CampaignRule, CartDiscount, DiscountType, TargetAudience,
        UsageLimit,
    };
    use tierstore_core::{
        DealerTier, Email, PaymentStatus, PriceTable, Product, UserId, Visibility,
    };

    use super::*;
    use crate::store::MemoryStore;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 10, 0, 0).unwrap()
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Mehmet Kaya".to_string(),
            email: Email::parse("mehmet@example.com").unwrap(),
            phone: "05550000000".to_string(),
            address_line: "Cumhuriyet Blv. 4".to_string(),
            city: "Ankara".to_string(),
            district: None,
            postal_code: None,
            country: "TR".to_string(),
        }
    }

    fn product(id: i32, retail: i64, large: i64, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            sku: format!("SKU-{id}"),
            category_id: None,
            prices: PriceTable {
                retail: Decimal::from(retail),
                dealer_small: Decimal::from(retail),
                dealer_medium: Decimal::from(retail),
                dealer_large: Decimal::from(large),
                dealer_main: Decimal::from(large),
            },
            visibility: Visibility::default(),
            stock,
        }
    }

    fn request(lines: &[(i32, u32)]) -> OrderRequest {
        OrderRequest {
            items: lines
                .iter()
                .map(|&(id, quantity)| CartLine {
                    product_id: ProductId::new(id),
                    quantity,
                })
                .collect(),
            shipping_address: address(),
            notes: None,
            campaign_id: None,
        }
    }

    fn dealer() -> UserIdentity {
        UserIdentity::dealer(UserId::new(1), DealerTier::Large)
    }

    #[tokio::test]
    async fn test_dealer_large_pays_tier_price() {
        let store = MemoryStore::new();
        store.insert_product(product(1, 100, 80, 5));

        let order = OrderService::new(&store)
            .create_order(&dealer(), request(&[(1, 3)]), now())
            .await
            .unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 3);
        assert_eq!(order.items[0].price, Decimal::from(80));
        assert_eq!(order.total_amount, Decimal::from(240));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(store.stock(ProductId::new(1)), Some(2));
    }

    #[tokio::test]
    async fn test_failure_on_later_line_rolls_back_earlier_lines() {
        let store = MemoryStore::new();
        store.insert_product(product(1, 100, 80, 5));
        store.insert_product(product(2, 50, 40, 1));

        let err = OrderService::new(&store)
            .create_order(&dealer(), request(&[(1, 2), (2, 3)]), now())
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::InsufficientStock(id) if id == ProductId::new(2)));
        assert_eq!(store.stock(ProductId::new(1)), Some(5));
        assert_eq!(store.stock(ProductId::new(2)), Some(1));
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_and_hidden_products_are_not_found() {
        let store = MemoryStore::new();
        let mut hidden = product(1, 100, 80, 5);
        hidden.visibility = Visibility {
            customer: false,
            dealer: true,
            dealer_main: true,
        };
        store.insert_product(hidden);
        let customer = UserIdentity::customer(UserId::new(2));
        let service = OrderService::new(&store);

        let err = service
            .create_order(&customer, request(&[(1, 1)]), now())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::ProductNotFound(_)));

        let err = service
            .create_order(&customer, request(&[(99, 1)]), now())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::ProductNotFound(id) if id == ProductId::new(99)));
        assert_eq!(store.stock(ProductId::new(1)), Some(5));
    }

    #[tokio::test]
    async fn test_dealer_without_tier_rolls_back() {
        let store = MemoryStore::new();
        store.insert_product(product(1, 100, 80, 5));
        let broken = UserIdentity {
            id: UserId::new(3),
            user_type: tierstore_core::UserType::Dealer,
            dealer_tier: None,
        };

        let err = OrderService::new(&store)
            .create_order(&broken, request(&[(1, 1)]), now())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Pricing(PricingError::MissingDealerTier)));
        assert_eq!(store.stock(ProductId::new(1)), Some(5));
    }

    #[tokio::test]
    async fn test_validation_happens_before_stock() {
        let store = MemoryStore::new();
        store.insert_product(product(1, 100, 80, 5));
        let service = OrderService::new(&store);

        let err = service
            .create_order(&dealer(), request(&[]), now())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation { field: "items", .. }));

        let err = service
            .create_order(&dealer(), request(&[(1, 0)]), now())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation { field: "items.quantity", .. }));

        let mut long_notes = request(&[(1, 1)]);
        long_notes.notes = Some("x".repeat(MAX_NOTES_LENGTH + 1));
        let err = service
            .create_order(&dealer(), long_notes, now())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation { field: "notes", .. }));

        assert_eq!(store.stock(ProductId::new(1)), Some(5));
    }

    #[tokio::test]
    async fn test_persist_failure_releases_stock_and_usage() {
        let store = MemoryStore::new();
        store.insert_product(product(1, 100, 80, 5));
        store.insert_campaign(cart_discount(Some(10)));
        store.fail_order_inserts(true);

        let mut req = request(&[(1, 3)]);
        req.campaign_id = Some(CampaignId::new(1));
        let err = OrderService::new(&store)
            .create_order(&dealer(), req, now())
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Repository(_)));
        assert_eq!(store.stock(ProductId::new(1)), Some(5));
        assert_eq!(store.campaign_usage(CampaignId::new(1)), Some(0));
    }

    fn cart_discount(total_usage: Option<u32>) -> Campaign {
        Campaign {
            id: CampaignId::new(1),
            name: "Ten off".to_string(),
            start_date: Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2026, 6, 30, 0, 0, 0).unwrap(),
            is_active: true,
            target_audience: TargetAudience {
                user_types: [AudienceSegment::All].into_iter().collect(),
                dealer_tiers: BTreeSet::new(),
            },
            usage_limit: UsageLimit {
                total_usage,
                per_user: None,
                current_usage: 0,
            },
            rule: CampaignRule::CartDiscount(CartDiscount {
                discount_type: DiscountType::Percentage,
                value: Decimal::from(10),
                min_cart_amount: Decimal::from(100),
                max_discount: None,
            }),
        }
    }

    #[tokio::test]
    async fn test_campaign_discount_is_server_derived() {
        let store = MemoryStore::new();
        store.insert_product(product(1, 100, 80, 5));
        store.insert_campaign(cart_discount(Some(10)));

        let mut req = request(&[(1, 3)]);
        req.campaign_id = Some(CampaignId::new(1));
        let order = OrderService::new(&store)
            .create_order(&dealer(), req, now())
            .await
            .unwrap();

        assert_eq!(order.total_amount, Decimal::from(240));
        assert_eq!(order.discount_amount, Decimal::from(24));
        assert_eq!(order.payable_amount(), Decimal::from(216));
        assert_eq!(order.campaign_id, Some(CampaignId::new(1)));
        assert_eq!(store.campaign_usage(CampaignId::new(1)), Some(1));
    }

    #[tokio::test]
    async fn test_exhausted_campaign_fails_order_and_restores_stock() {
        let store = MemoryStore::new();
        store.insert_product(product(1, 100, 80, 5));
        let mut campaign = cart_discount(Some(1));
        campaign.usage_limit.current_usage = 1;
        store.insert_campaign(campaign);

        let mut req = request(&[(1, 3)]);
        req.campaign_id = Some(CampaignId::new(1));
        let err = OrderService::new(&store)
            .create_order(&dealer(), req, now())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::CampaignRejected(CampaignRejection::NotApplicable(Rejection::NotLive { .. }))
        ));
        assert_eq!(store.stock(ProductId::new(1)), Some(5));
    }

    #[tokio::test]
    async fn test_per_user_limit() {
        let store = MemoryStore::new();
        store.insert_product(product(1, 100, 80, 10));
        let mut campaign = cart_discount(None);
        campaign.usage_limit.per_user = Some(1);
        store.insert_campaign(campaign);
        let service = OrderService::new(&store);

        let mut req = request(&[(1, 2)]);
        req.campaign_id = Some(CampaignId::new(1));
        service.create_order(&dealer(), req.clone(), now()).await.unwrap();

        let err = service
            .create_order(&dealer(), req, now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::CampaignRejected(CampaignRejection::PerUserLimitReached)
        ));
        assert_eq!(store.stock(ProductId::new(1)), Some(8));
    }

    #[tokio::test]
    async fn test_unmet_minimum_rejects_without_counting_usage() {
        let store = MemoryStore::new();
        store.insert_product(product(1, 100, 40, 10));
        let mut campaign = cart_discount(None);
        campaign.usage_limit.per_user = Some(1);
        campaign.rule = CampaignRule::CartDiscount(CartDiscount {
            discount_type: DiscountType::Percentage,
            value: Decimal::from(10),
            min_cart_amount: Decimal::from(2500),
            max_discount: None,
        });
        store.insert_campaign(campaign);
        let service = OrderService::new(&store);

        let mut req = request(&[(1, 1)]);
        req.campaign_id = Some(CampaignId::new(1));
        let err = service
            .create_order(&dealer(), req, now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::CampaignRejected(CampaignRejection::BelowMinimum(shortfall))
                if shortfall == Decimal::from(2460)
        ));
        assert_eq!(store.campaign_usage(CampaignId::new(1)), Some(0));
        assert_eq!(store.stock(ProductId::new(1)), Some(10));

        let mut req = request(&[(1, 10)]);
        req.campaign_id = Some(CampaignId::new(1));
        let err = service
            .create_order(&dealer(), req.clone(), now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::CampaignRejected(CampaignRejection::BelowMinimum(_))
        ));

        store.insert_product(product(1, 100, 300, 10));
        let order = service.create_order(&dealer(), req, now()).await.unwrap();
        assert_eq!(order.discount_amount, Decimal::from(300));
        assert_eq!(store.campaign_usage(CampaignId::new(1)), Some(1));
    }

    #[tokio::test]
    async fn test_status_moves_forward_and_cancel_restocks() {
        let store = MemoryStore::new();
        store.insert_product(product(1, 100, 80, 5));
        let service = OrderService::new(&store);
        let order = service
            .create_order(&dealer(), request(&[(1, 2)]), now())
            .await
            .unwrap();
        assert_eq!(store.stock(ProductId::new(1)), Some(3));

        let confirmed = service
            .advance_status(order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);

        let err = service
            .advance_status(order.id, OrderStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));

        service
            .advance_status(order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(store.stock(ProductId::new(1)), Some(5));

        let err = service
            .advance_status(order.id, OrderStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_cancel_after_shipping_keeps_stock() {
        let store = MemoryStore::new();
        store.insert_product(product(1, 100, 80, 5));
        let service = OrderService::new(&store);
        let order = service
            .create_order(&dealer(), request(&[(1, 2)]), now())
            .await
            .unwrap();

        service
            .advance_status(order.id, OrderStatus::Shipped)
            .await
            .unwrap();
        service
            .advance_status(order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(store.stock(ProductId::new(1)), Some(3));
    }
}
