//! PayTR payment gateway integration.
//!
//! This module provides:
//! - [`PaytrClient`] for minting hosted-page tokens
//! - Signature helpers for token requests and callbacks
//! - Wire types for the token endpoint and the callback form
//!
//! # Flow
//!
//! 1. The shopper asks for a token for an unpaid order
//! 2. The client signs the order details and POSTs them to PayTR
//! 3. The shopper pays on the hosted page
//! 4. PayTR POSTs a signed callback, which is verified before any state changes

mod client;
mod error;
pub mod signature;
mod types;

pub use client::PaytrClient;
pub use error::PaytrError;
pub use types::{
    BasketLine, CallbackForm, PaymentRequest, TokenForm, TokenResponse, to_minor_units,
};
