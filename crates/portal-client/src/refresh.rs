//! Request-time token refresh
//!
//! Exchanges the stored refresh token for a new access token when a
//! request comes back 401. A rejected refresh clears the session before
//! the error reaches the caller, so a caught error always means "force
//! login", never "inconsistent tokens left behind".
//!
//! Concurrent 401s each run their own refresh; there is no in-flight
//! de-duplication. The refresh endpoint is idempotent per valid refresh
//! token, so duplicate refreshes waste a round trip but stay correct, and
//! a failed concurrent refresh clears the session for everyone.

use portal_session::{SessionUpdate, TokenStore, api};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Refresh the stored access token in place.
///
/// Reads the refresh token from the store, posts it to the refresh
/// endpoint, and persists the result with a partial update so a response
/// without a new refresh token keeps the stored one.
pub(crate) async fn run(
    http: &reqwest::Client,
    base_url: &str,
    store: &TokenStore,
) -> Result<()> {
    let Some(refresh_token) = store.refresh_token().await else {
        debug!("no refresh token stored, nothing to exchange");
        return Err(Error::NoRefreshToken);
    };

    match api::refresh(http, base_url, &refresh_token).await {
        Ok(pair) => {
            let issued_new_refresh = pair.refresh_token.is_some();
            store
                .set(SessionUpdate {
                    access_token: Some(pair.access_token),
                    refresh_token: pair.refresh_token,
                    email: None,
                })
                .await
                .map_err(|e| Error::Store(e.to_string()))?;
            info!(issued_new_refresh, "access token refreshed");
            Ok(())
        }
        Err(portal_session::Error::Api(api_err)) => {
            warn!(
                status = api_err.status,
                detail = %api_err.detail,
                "refresh rejected, clearing session"
            );
            if let Err(e) = store.clear().await {
                warn!(error = %e, "failed to clear session after rejected refresh");
            }
            Err(Error::RefreshRejected {
                status: api_err.status,
                detail: api_err.detail,
            })
        }
        // Transport and malformed-response failures leave the session
        // untouched; the next 401 will try again.
        Err(e) => Err(e.into()),
    }
}
