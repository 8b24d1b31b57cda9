//! Tierstore Core - checkout domain types and pure pricing logic.
//!
//! Used by:
//! - `checkout` - HTTP service that assembles orders and takes payments
//! - `cli` - migrations and catalog seeding
//!
//! # Architecture
//!
//! Nothing in this crate performs I/O. Callers pass in the identity, the
//! clock and the catalog rows they loaded, which keeps every function here
//! deterministic and cheap to test.
//!
//! # Modules
//!
//! - [`types`] - IDs, users, products and order snapshots
//! - [`pricing`] - tier price and visibility resolution
//! - [`campaign`] - campaign definitions and evaluation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod campaign;
pub mod pricing;
pub mod types;

pub use pricing::{PricingError, resolve_price, resolve_visibility};
pub use types::*;
