//! Core types for Tierstore.

pub mod email;
pub mod id;
pub mod order;
pub mod product;
pub mod user;

pub use email::{Email, EmailError};
pub use id::*;
pub use order::{NewOrder, Order, OrderItem, OrderStatus, PaymentStatus, ShippingAddress};
pub use product::{PriceTable, Product, Visibility};
pub use user::{DealerTier, UserIdentity, UserType};
