//! Auth endpoint calls
//!
//! The three token interactions with the portal backend:
//! 1. Login (email/password → access + refresh pair)
//! 2. Register (email/password → created-account payload)
//! 3. Refresh (refresh token → new access token, sometimes a new refresh)
//!
//! All three POST JSON to paths under `/auth` relative to the configured
//! base address. Failures are normalized to one [`ApiError`] shape by
//! `api_error`; callers never inspect raw bodies.

use common::Secret;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Error, Result};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

/// Token pair from login or refresh.
///
/// The refresh endpoint issues only a new access token; `refresh_token`
/// deserializes to `None` there, and the caller keeps the stored one.
#[derive(Debug, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Created-account payload from the register endpoint.
#[derive(Debug, Deserialize)]
pub struct RegisteredAccount {
    pub msg: String,
    pub user_id: i64,
}

/// Exchange an email/password for a token pair.
pub async fn login(
    client: &reqwest::Client,
    base_url: &str,
    email: &str,
    password: &Secret<String>,
) -> Result<TokenPair> {
    let response = client
        .post(format!("{base_url}{LOGIN_PATH}"))
        .json(&CredentialsBody {
            email,
            password: password.expose(),
        })
        .send()
        .await
        .map_err(|e| Error::Http(format!("login request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(api_error(response).await);
    }

    response
        .json::<TokenPair>()
        .await
        .map_err(|e| Error::InvalidResponse(format!("login response: {e}")))
}

/// Create a new account.
pub async fn register(
    client: &reqwest::Client,
    base_url: &str,
    email: &str,
    password: &Secret<String>,
) -> Result<RegisteredAccount> {
    let response = client
        .post(format!("{base_url}{REGISTER_PATH}"))
        .json(&CredentialsBody {
            email,
            password: password.expose(),
        })
        .send()
        .await
        .map_err(|e| Error::Http(format!("register request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(api_error(response).await);
    }

    response
        .json::<RegisteredAccount>()
        .await
        .map_err(|e| Error::InvalidResponse(format!("register response: {e}")))
}

/// Exchange a refresh token for a new access token.
///
/// Raw endpoint call only; reading the stored token and persisting the
/// result belong to the client's refresh flow, which also decides when
/// the session must be cleared.
pub async fn refresh(
    client: &reqwest::Client,
    base_url: &str,
    refresh_token: &str,
) -> Result<TokenPair> {
    let response = client
        .post(format!("{base_url}{REFRESH_PATH}"))
        .json(&RefreshBody { refresh_token })
        .send()
        .await
        .map_err(|e| Error::Http(format!("refresh request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(api_error(response).await);
    }

    response
        .json::<TokenPair>()
        .await
        .map_err(|e| Error::InvalidResponse(format!("refresh response: {e}")))
}

/// Normalize a non-2xx auth response into [`ApiError`].
///
/// Uses the server's `{detail}` field when the body is JSON and carries
/// one, otherwise falls back to `HTTP error <status>`.
async fn api_error(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let detail = match response.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("detail")
            .and_then(|d| d.as_str())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("HTTP error {status}")),
        Err(_) => format!("HTTP error {status}"),
    };
    Error::Api(ApiError { status, detail })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use tokio::net::TcpListener;

    #[test]
    fn token_pair_deserializes_with_refresh() {
        let json = r#"{"msg":"Login Successful","access_token":"at_1","refresh_token":"rt_1","token_type":"bearer"}"#;
        let pair: TokenPair = serde_json::from_str(json).unwrap();
        assert_eq!(pair.access_token, "at_1");
        assert_eq!(pair.refresh_token.as_deref(), Some("rt_1"));
    }

    #[test]
    fn token_pair_refresh_token_defaults_to_none() {
        // The refresh endpoint omits refresh_token entirely
        let json = r#"{"msg":"Token Refreshed","access_token":"at_2","token_type":"bearer"}"#;
        let pair: TokenPair = serde_json::from_str(json).unwrap();
        assert_eq!(pair.access_token, "at_2");
        assert!(pair.refresh_token.is_none());
    }

    #[test]
    fn registered_account_deserializes() {
        let json = r#"{"msg":"User Created","user_id":42}"#;
        let account: RegisteredAccount = serde_json::from_str(json).unwrap();
        assert_eq!(account.msg, "User Created");
        assert_eq!(account.user_id, 42);
    }

    /// Serve the given router on an ephemeral port, returning its base URL.
    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn login_returns_token_pair() {
        let app = Router::new().route(
            "/auth/login",
            post(|body: axum::Json<serde_json::Value>| async move {
                assert_eq!(body["email"], "pat@example.com");
                assert_eq!(body["password"], "hunter22");
                axum::Json(serde_json::json!({
                    "msg": "Login Successful",
                    "access_token": "at_login",
                    "refresh_token": "rt_login",
                    "token_type": "bearer",
                }))
            }),
        );
        let base = serve(app).await;

        let client = reqwest::Client::new();
        let password = Secret::new(String::from("hunter22"));
        let pair = login(&client, &base, "pat@example.com", &password)
            .await
            .unwrap();
        assert_eq!(pair.access_token, "at_login");
        assert_eq!(pair.refresh_token.as_deref(), Some("rt_login"));
    }

    #[tokio::test]
    async fn login_rejection_carries_server_detail() {
        let app = Router::new().route(
            "/auth/login",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    axum::Json(serde_json::json!({"detail": "Invalid Credentials"})),
                )
            }),
        );
        let base = serve(app).await;

        let client = reqwest::Client::new();
        let password = Secret::new(String::from("wrong"));
        let err = login(&client, &base, "pat@example.com", &password)
            .await
            .unwrap_err();
        match err {
            Error::Api(api) => {
                assert_eq!(api.status, 401);
                assert_eq!(api.detail, "Invalid Credentials");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_body_falls_back_to_generic_detail() {
        let app = Router::new().route(
            "/auth/refresh",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream exploded") }),
        );
        let base = serve(app).await;

        let client = reqwest::Client::new();
        let err = refresh(&client, &base, "rt_x").await.unwrap_err();
        match err {
            Error::Api(api) => {
                assert_eq!(api.status, 502);
                assert_eq!(api.detail, "HTTP error 502");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn register_returns_created_account() {
        let app = Router::new().route(
            "/auth/register",
            post(|| async {
                axum::Json(serde_json::json!({"msg": "User Created", "user_id": 7}))
            }),
        );
        let base = serve(app).await;

        let client = reqwest::Client::new();
        let password = Secret::new(String::from("hunter22"));
        let account = register(&client, &base, "new@example.com", &password)
            .await
            .unwrap();
        assert_eq!(account.user_id, 7);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // Nothing listens on port 1
        let client = reqwest::Client::new();
        let err = refresh(&client, "http://127.0.0.1:1", "rt_x")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn refresh_posts_the_token_in_the_body() {
        let app = Router::new().route(
            "/auth/refresh",
            post(|body: axum::Json<serde_json::Value>| async move {
                assert_eq!(body["refresh_token"], "rt_wire");
                axum::Json(serde_json::json!({
                    "msg": "Token Refreshed",
                    "access_token": "at_new",
                    "token_type": "bearer",
                }))
            }),
        );
        let base = serve(app).await;

        let client = reqwest::Client::new();
        let pair = refresh(&client, &base, "rt_wire").await.unwrap();
        assert_eq!(pair.access_token, "at_new");
        assert!(pair.refresh_token.is_none());
    }
}
