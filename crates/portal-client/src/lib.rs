//! Authenticated fetch client for the Aptiv recruitment portal
//!
//! Wraps the HTTP transport with the session contract every data screen
//! relies on: attach the stored bearer token, refresh it transparently on
//! a 401, retry the original request exactly once, and surface a terminal
//! error when the session cannot be recovered.
//!
//! Request flow:
//! 1. Caller invokes [`PortalClient::request`] with a path and options
//! 2. The client reads the access token from the [`TokenStore`] and sends
//! 3. Non-401 responses come back verbatim, success or not — business
//!    errors are the caller's to interpret
//! 4. A 401 triggers one refresh; on success the request is rebuilt from
//!    the original options and sent once more
//! 5. A failed refresh clears the session and returns an error; the
//!    caller redirects to the login screen

pub mod client;
pub mod config;
pub mod error;
mod refresh;

pub use client::{PortalClient, RequestOptions};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use portal_session::{SessionUpdate, TokenStore};
