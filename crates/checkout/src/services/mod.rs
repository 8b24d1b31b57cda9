//! Checkout business logic.
//!
//! Services are generic over the [`crate::store`] traits so the same code runs
//! against Postgres in production and the in-memory store in tests.
//!
//! - `orders` - order placement, stock reservation, status administration
//! - `campaigns` - campaign preview for a client-side cart
//! - `payments` - PayTR token issuance, callbacks and manual overrides

pub mod campaigns;
pub mod orders;
pub mod payments;
