//! Error types for session operations

use std::fmt;

/// Normalized non-2xx auth response: HTTP status plus the server's
/// `detail` message (or a generic fallback when the body has none).
///
/// Every auth endpoint failure is funneled through this one shape so
/// callers never have to duck-type response bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub detail: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.detail, self.status)
    }
}

/// Errors from session storage and auth endpoint calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("auth endpoint rejected request: {0}")]
    Api(ApiError),

    #[error("invalid auth response: {0}")]
    InvalidResponse(String),

    #[error("session store I/O error: {0}")]
    Io(String),
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
