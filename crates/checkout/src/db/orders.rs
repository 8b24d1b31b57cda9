//! Order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use tierstore_core::{
    CampaignId, NewOrder, Order, OrderId, OrderItem, OrderStatus, PaymentStatus, ShippingAddress,
    UserId,
};

use super::RepositoryError;

const ORDER_COLUMNS: &str = r"
    id, user_id, user_type, items, total_amount, discount_amount, free_shipping,
    campaign_id, status, payment_status, payment_provider, payment_token,
    payment_transaction_id, shipping_address, notes, created_at, updated_at
";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    user_type: String,
    items: Json<Vec<OrderItem>>,
    total_amount: Decimal,
    discount_amount: Decimal,
    free_shipping: bool,
    campaign_id: Option<CampaignId>,
    status: String,
    payment_status: String,
    payment_provider: Option<String>,
    payment_token: Option<String>,
    payment_transaction_id: Option<String>,
    shipping_address: Json<ShippingAddress>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            user_type: row
                .user_type
                .parse()
                .map_err(RepositoryError::DataCorruption)?,
            items: row.items.0,
            total_amount: row.total_amount,
            discount_amount: row.discount_amount,
            free_shipping: row.free_shipping,
            campaign_id: row.campaign_id,
            status: row.status.parse().map_err(RepositoryError::DataCorruption)?,
            payment_status: row
                .payment_status
                .parse()
                .map_err(RepositoryError::DataCorruption)?,
            payment_provider: row.payment_provider,
            payment_token: row.payment_token,
            payment_transaction_id: row.payment_transaction_id,
            shipping_address: row.shipping_address.0,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new `pending`/`unpaid` order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders (
                user_id, user_type, items, total_amount, discount_amount,
                free_shipping, campaign_id, status, payment_status,
                shipping_address, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', 'unpaid', $8, $9)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id)
        .bind(order.user_type.as_str())
        .bind(Json(&order.items))
        .bind(order.total_amount)
        .bind(order.discount_amount)
        .bind(order.free_shipping)
        .bind(order.campaign_id)
        .bind(Json(&order.shipping_address))
        .bind(order.notes.as_deref())
        .fetch_one(self.pool)
        .await?;

        Order::try_from(row)
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a status column is invalid.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Move `status` from `from` to `to` if it has not changed meanwhile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn compare_and_set_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            ",
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Store the gateway token on an unpaid order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_payment_token(
        &self,
        id: OrderId,
        provider: &str,
        token: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET payment_provider = $2, payment_token = $3, updated_at = NOW()
            WHERE id = $1 AND payment_status = 'unpaid'
            ",
        )
        .bind(id)
        .bind(provider)
        .bind(token)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Settle an unpaid order as `paid` or `failed`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn settle_payment(
        &self,
        id: OrderId,
        outcome: PaymentStatus,
        transaction_id: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET payment_status = $2,
                status = CASE
                    WHEN $2 = 'paid' AND status = 'pending' THEN 'confirmed'
                    ELSE status
                END,
                payment_transaction_id = CASE
                    WHEN $2 = 'paid' THEN COALESCE($3, payment_transaction_id)
                    ELSE payment_transaction_id
                END,
                updated_at = NOW()
            WHERE id = $1 AND payment_status = 'unpaid'
            ",
        )
        .bind(id)
        .bind(outcome.as_str())
        .bind(transaction_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
