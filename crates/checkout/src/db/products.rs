//! Product repository: catalog rows and atomic stock changes.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tierstore_core::{CategoryId, PriceTable, Product, ProductId, Visibility};

use super::{RepositoryError, to_i32, to_u32};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    sku: String,
    category_id: Option<CategoryId>,
    price_retail: Decimal,
    price_dealer_small: Decimal,
    price_dealer_medium: Decimal,
    price_dealer_large: Decimal,
    price_dealer_main: Decimal,
    visible_customer: bool,
    visible_dealer: bool,
    visible_dealer_main: bool,
    stock: i32,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            sku: row.sku,
            category_id: row.category_id,
            prices: PriceTable {
                retail: row.price_retail,
                dealer_small: row.price_dealer_small,
                dealer_medium: row.price_dealer_medium,
                dealer_large: row.price_dealer_large,
                dealer_main: row.price_dealer_main,
            },
            visibility: Visibility {
                customer: row.visible_customer,
                dealer: row.visible_dealer,
                dealer_main: row.visible_dealer_main,
            },
            stock: to_u32(row.stock, "stock")?,
        })
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored stock is negative.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, sku, category_id,
                   price_retail, price_dealer_small, price_dealer_medium,
                   price_dealer_large, price_dealer_main,
                   visible_customer, visible_dealer, visible_dealer_main,
                   stock
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Decrement stock by `quantity` only if enough remains.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reserve_stock(
        &self,
        id: ProductId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        let quantity = to_i32(quantity, "quantity")?;
        let result = sqlx::query(
            r"
            UPDATE products
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            ",
        )
        .bind(id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Return units to stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product no longer exists.
    pub async fn release_stock(&self, id: ProductId, quantity: u32) -> Result<(), RepositoryError> {
        let quantity = to_i32(quantity, "quantity")?;
        let result = sqlx::query(
            r"
            UPDATE products
            SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Insert or replace a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU belongs to another product.
    pub async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO products (
                id, name, sku, category_id,
                price_retail, price_dealer_small, price_dealer_medium,
                price_dealer_large, price_dealer_main,
                visible_customer, visible_dealer, visible_dealer_main,
                stock
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                sku = EXCLUDED.sku,
                category_id = EXCLUDED.category_id,
                price_retail = EXCLUDED.price_retail,
                price_dealer_small = EXCLUDED.price_dealer_small,
                price_dealer_medium = EXCLUDED.price_dealer_medium,
                price_dealer_large = EXCLUDED.price_dealer_large,
                price_dealer_main = EXCLUDED.price_dealer_main,
                visible_customer = EXCLUDED.visible_customer,
                visible_dealer = EXCLUDED.visible_dealer,
                visible_dealer_main = EXCLUDED.visible_dealer_main,
                stock = EXCLUDED.stock,
                updated_at = NOW()
            ",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.category_id)
        .bind(product.prices.retail)
        .bind(product.prices.dealer_small)
        .bind(product.prices.dealer_medium)
        .bind(product.prices.dealer_large)
        .bind(product.prices.dealer_main)
        .bind(product.visibility.customer)
        .bind(product.visibility.dealer)
        .bind(product.visibility.dealer_main)
        .bind(to_i32(product.stock, "stock")?)
        .execute(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict(format!("sku already in use: {}", product.sku))
            }
            other => RepositoryError::Database(other),
        })?;

        Ok(())
    }

    /// Move the ID sequence past explicitly inserted IDs.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sync_id_sequence(&self) -> Result<(), RepositoryError> {
        sqlx::query(
            "SELECT setval(pg_get_serial_sequence('products', 'id'), GREATEST(MAX(id), 1)) FROM products",
        )
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
