//! PayTR-related errors.

use thiserror::Error;

/// Errors that can occur when talking to PayTR.
#[derive(Debug, Error)]
pub enum PaytrError {
    /// The request never produced a response (connect failure, timeout).
    #[error("PayTR request failed: {0}")]
    Request(String),

    /// PayTR answered with a server error.
    #[error("PayTR returned HTTP {0}")]
    ServerError(u16),

    /// The response body could not be understood.
    #[error("PayTR response error: {0}")]
    Response(String),

    /// PayTR refused to issue a token.
    #[error("PayTR rejected the request: {0}")]
    Rejected(String),

    /// A callback hash did not match the recomputed signature.
    #[error("PayTR callback signature mismatch")]
    SignatureMismatch,

    /// The request could not be built locally.
    #[error("PayTR request encoding error: {0}")]
    Encoding(String),
}

impl PaytrError {
    /// Whether retrying the same request later might succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Request(_) | Self::ServerError(_) | Self::Response(_)
        )
    }
}
