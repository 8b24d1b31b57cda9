//! Application state shared across handlers.

use std::sync::Arc;

use crate::paytr::PaytrClient;
use crate::store::CheckoutStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Generic over the storage backend so routes
/// can be exercised against [`crate::store::MemoryStore`].
pub struct AppState<S> {
    inner: Arc<AppStateInner<S>>,
}

struct AppStateInner<S> {
    store: S,
    paytr: Option<PaytrClient>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: CheckoutStore> AppState<S> {
    /// Create a new application state.
    ///
    /// A `None` payment client leaves the payment routes answering
    /// `503 Service Unavailable`.
    #[must_use]
    pub fn new(store: S, paytr: Option<PaytrClient>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { store, paytr }),
        }
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Get the PayTR client, if payments are configured.
    #[must_use]
    pub fn paytr(&self) -> Option<&PaytrClient> {
        self.inner.paytr.as_ref()
    }
}
