//! Session substrate for the Aptiv recruitment portal client
//!
//! Holds the two pieces every data screen depends on but none of them own:
//! durable storage for the access/refresh token pair (plus the signed-in
//! email) and the raw calls to the portal's auth endpoints. This crate has
//! no dependency on the fetch client, so the client can depend on it
//! without a cycle.
//!
//! Session lifecycle:
//! 1. `api::login()` returns a token pair for an email/password
//! 2. Tokens persisted via `TokenStore::set()`
//! 3. The fetch client reads the access token for each request
//! 4. On 401, `api::refresh()` mints a new access token
//! 5. The refreshed token is stored with a partial `set()` so a missing
//!    `refresh_token` in the response keeps the old one
//! 6. Logout or a rejected refresh calls `TokenStore::clear()`

pub mod api;
pub mod error;
pub mod store;

pub use api::{RegisteredAccount, TokenPair};
pub use error::{ApiError, Error, Result};
pub use store::{SessionUpdate, TokenStore};
