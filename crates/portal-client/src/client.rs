//! Authenticated request path
//!
//! One logical request with token attachment and the single
//! refresh-and-retry cycle hidden from the caller. The client never
//! interprets business responses: anything other than the triggering 401
//! is handed back verbatim.

use std::sync::Arc;

use common::Secret;
use portal_session::{RegisteredAccount, SessionUpdate, TokenStore, api};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::refresh;

/// Caller-supplied request shape.
///
/// Headers and body are kept owned so the retry after a refresh can be
/// rebuilt from the original options instead of the first attempt's
/// headers, which would leak the stale bearer token.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn post(body: serde_json::Value) -> Self {
        let mut options = Self::new(Method::POST);
        options.body = Some(body);
        options
    }

    pub fn put(body: serde_json::Value) -> Self {
        let mut options = Self::new(Method::PUT);
        options.body = Some(body);
        options
    }

    /// Add a header. Caller headers are preserved on both attempts;
    /// `Content-Type` set here suppresses the JSON default.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

/// Authenticated fetch client for the portal API.
///
/// Cheap to share behind an `Arc`; the underlying `reqwest::Client` pools
/// connections internally.
pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<TokenStore>,
}

impl PortalClient {
    pub fn new(base_url: impl Into<String>, store: Arc<TokenStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            store,
        }
    }

    /// Build a client from loaded configuration, applying the configured
    /// request timeout to the transport.
    pub fn from_config(config: &ClientConfig, store: Arc<TokenStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.api.timeout_secs))
            .build()
            .map_err(|e| Error::Transport(format!("building http client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.api.base_url.clone(),
            store,
        })
    }

    /// The shared token store backing this client.
    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Perform one logical request against the portal API.
    ///
    /// `path` is resolved against the configured base address unless it is
    /// already an absolute `http(s)://` URL. The stored access token is
    /// attached as a bearer header; `Content-Type: application/json` is
    /// applied only when the caller did not set one.
    ///
    /// A 401 triggers exactly one refresh-and-retry cycle. The second
    /// response is returned whatever its status; a failed refresh clears
    /// the session and surfaces as an error instead of a response.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<reqwest::Response> {
        let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
        let url = self.resolve_url(path);

        debug!(request_id, method = %options.method, %url, "sending request");
        let first = self.attempt(&url, &options).await?;
        if first.status() != StatusCode::UNAUTHORIZED {
            return Ok(first);
        }

        debug!(request_id, %url, "unauthorized, refreshing access token");
        refresh::run(&self.http, &self.base_url, &self.store).await?;

        // Headers are rebuilt from the original options so the retry
        // carries the refreshed token, not the first attempt's.
        let second = self.attempt(&url, &options).await?;
        if second.status() == StatusCode::UNAUTHORIZED {
            warn!(request_id, %url, "still unauthorized after refresh, returning to caller");
        }
        Ok(second)
    }

    /// [`request`](Self::request), racing the view's cancellation token.
    ///
    /// When the token fires first the in-flight request future is dropped:
    /// no retry is issued, no store mutation happens, and the discarded
    /// response can never reach a torn-down view.
    pub async fn request_cancellable(
        &self,
        path: &str,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response> {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(path, "request cancelled, result discarded");
                Err(Error::Cancelled)
            }
            result = self.request(path, options) => result,
        }
    }

    /// Log in and persist the session (both tokens plus the email).
    pub async fn login(&self, email: &str, password: Secret<String>) -> Result<()> {
        let pair = api::login(&self.http, &self.base_url, email, &password).await?;
        self.store
            .set(SessionUpdate {
                access_token: Some(pair.access_token),
                refresh_token: pair.refresh_token,
                email: Some(email.to_owned()),
            })
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        info!(email, "logged in");
        Ok(())
    }

    /// Create an account. Does not log in or touch the session.
    pub async fn register(
        &self,
        email: &str,
        password: Secret<String>,
    ) -> Result<RegisteredAccount> {
        let account = api::register(&self.http, &self.base_url, email, &password).await?;
        info!(email, user_id = account.user_id, "account registered");
        Ok(account)
    }

    /// Current access token, if logged in.
    pub async fn access_token(&self) -> Option<String> {
        self.store.access_token().await
    }

    /// Email of the signed-in user.
    pub async fn email(&self) -> Option<String> {
        self.store.email().await
    }

    /// Drop the whole session. Idempotent; used for logout and after
    /// terminal auth failures.
    pub async fn clear_tokens(&self) -> Result<()> {
        self.store
            .clear()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        info!("session cleared");
        Ok(())
    }

    /// One transport attempt with headers built fresh from the options.
    async fn attempt(&self, url: &str, options: &RequestOptions) -> Result<reqwest::Response> {
        let mut headers = options.headers.clone();
        if let Some(token) = self.store.access_token().await {
            let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| Error::Transport("stored access token is not a valid header value".into()))?;
            headers.insert(header::AUTHORIZATION, bearer);
        }
        if !headers.contains_key(header::CONTENT_TYPE) {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }

        let mut builder = self
            .http
            .request(options.method.clone(), url)
            .headers(headers);
        if let Some(body) = &options.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| Error::Transport(format!("serializing request body: {e}")))?;
            builder = builder.body(bytes);
        }

        builder
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }

    fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_owned()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }
}
