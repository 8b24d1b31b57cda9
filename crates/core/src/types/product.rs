//! Catalog product as seen by the checkout engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};

/// Unit prices per buyer segment. All amounts are tax inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    pub retail: Decimal,
    pub dealer_small: Decimal,
    pub dealer_medium: Decimal,
    pub dealer_large: Decimal,
    pub dealer_main: Decimal,
}

impl PriceTable {
    /// A table where every segment pays the same price.
    #[must_use]
    pub const fn flat(price: Decimal) -> Self {
        Self {
            retail: price,
            dealer_small: price,
            dealer_medium: price,
            dealer_large: price,
            dealer_main: price,
        }
    }

    /// Whether every column is non-negative.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [
            self.retail,
            self.dealer_small,
            self.dealer_medium,
            self.dealer_large,
            self.dealer_main,
        ]
        .iter()
        .all(|price| !price.is_sign_negative())
    }
}

/// Which buyer segments may see a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub customer: bool,
    pub dealer: bool,
    pub dealer_main: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            customer: true,
            dealer: true,
            dealer_main: true,
        }
    }
}

/// A product with the fields checkout depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub prices: PriceTable,
    #[serde(default)]
    pub visibility: Visibility,
    pub stock: u32,
}
