//! HTTP middleware and extractors for the checkout service.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//! 4. Rate limiting (governor) on the customer-facing API

pub mod auth;
pub mod client_ip;
pub mod rate_limit;
pub mod session;

pub use auth::{OptionalUser, RequireAdmin, RequireUser, SESSION_USER_ID, set_session_user};
pub use client_ip::{ClientIp, forwarded_client_ip};
pub use rate_limit::{RateLimiterLayer, api_rate_limiter};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
