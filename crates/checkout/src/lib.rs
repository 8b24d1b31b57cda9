//! Tierstore Checkout library.
//!
//! Order placement with tiered pricing, campaign discounts and PayTR
//! payments. Exposed as a library so routes can be tested in-process
//! against the in-memory store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod paytr;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
