//! Error types for the fetch client
//!
//! Only session-ending and transport conditions are errors. Business
//! 4xx/5xx responses (including a second 401 after a successful refresh)
//! are returned as ordinary responses, so callers keep one pattern:
//! inspect the status for business logic, catch errors for re-login.

use portal_session::ApiError;

/// Errors from authenticated requests and auth convenience calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No session to refresh. Terminal: the caller must force a login.
    #[error("no refresh token stored")]
    NoRefreshToken,

    /// The server invalidated the refresh token. The session has already
    /// been cleared; the caller must force a login.
    #[error("refresh rejected ({status}): {detail}")]
    RefreshRejected { status: u16, detail: String },

    /// Network failure (offline, timeout, DNS). The session is untouched;
    /// typically retried or surfaced inline rather than forcing a login.
    #[error("transport error: {0}")]
    Transport(String),

    /// Normalized non-2xx from the login/register convenience calls.
    #[error("auth request rejected: {0}")]
    Api(ApiError),

    /// Session file could not be read or written.
    #[error("session store error: {0}")]
    Store(String),

    /// The request's cancellation token fired before the response
    /// resolved. The result was discarded without touching shared state.
    #[error("request cancelled")]
    Cancelled,
}

impl From<portal_session::Error> for Error {
    fn from(err: portal_session::Error) -> Self {
        match err {
            portal_session::Error::Http(msg) => Error::Transport(msg),
            portal_session::Error::InvalidResponse(msg) => Error::Transport(msg),
            portal_session::Error::Api(api) => Error::Api(api),
            portal_session::Error::Io(msg) => Error::Store(msg),
        }
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_rejected_display_carries_status_and_detail() {
        let err = Error::RefreshRejected {
            status: 401,
            detail: "Invalid or expired refresh token".into(),
        };
        assert_eq!(
            err.to_string(),
            "refresh rejected (401): Invalid or expired refresh token"
        );
    }

    #[test]
    fn session_transport_error_maps_to_transport() {
        let err: Error = portal_session::Error::Http("connection refused".into()).into();
        assert!(matches!(err, Error::Transport(_)), "got {err:?}");
    }

    #[test]
    fn session_io_error_maps_to_store() {
        let err: Error = portal_session::Error::Io("disk full".into()).into();
        assert!(matches!(err, Error::Store(_)), "got {err:?}");
    }
}
