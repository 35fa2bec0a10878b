//! Durable token storage
//!
//! Persists the session fields (access token, refresh token, email) in a
//! JSON file, the desktop analogue of the web client's localStorage keys.
//! All writes use atomic temp-file + rename to prevent corruption on crash.
//! A tokio Mutex serializes concurrent access so a login and an in-flight
//! refresh cannot lose each other's fields.
//!
//! Storage is assumed always available: a missing or unreadable file
//! degrades to "no session" instead of failing the caller.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// On-disk session record.
///
/// Keys keep the `aptiv_` namespace the web client used in localStorage,
/// so the file stays recognizable and collision-free if it ever shares a
/// directory with unrelated state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionRecord {
    #[serde(rename = "aptiv_access_token", default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(rename = "aptiv_refresh_token", default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(rename = "aptiv_email", default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

/// Partial update applied by [`TokenStore::set`].
///
/// Fields left as `None` are not touched. A refresh response that carries
/// only a new access token must not erase the stored refresh token, so the
/// update is field-wise, never a wholesale replacement.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub email: Option<String>,
}

/// Thread-safe session file manager.
///
/// The Mutex serializes all access. Reads acquire the lock briefly to
/// clone the requested field, so they don't block on in-progress writes
/// for longer than the copy takes.
pub struct TokenStore {
    path: PathBuf,
    state: Mutex<SessionRecord>,
}

impl TokenStore {
    /// Load the session from the given file path.
    ///
    /// A missing file means "logged out" and creates an empty record. A
    /// file that fails to parse is treated the same way, with a warning;
    /// the next write replaces it.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading session file: {e}")))?;
            match serde_json::from_str::<SessionRecord>(&contents) {
                Ok(record) => {
                    info!(
                        path = %path.display(),
                        logged_in = record.access_token.is_some(),
                        "loaded session"
                    );
                    record
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "session file unreadable, starting logged out");
                    SessionRecord::default()
                }
            }
        } else {
            info!(path = %path.display(), "no session file, starting logged out");
            let record = SessionRecord::default();
            write_atomic(&path, &record).await?;
            record
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Current access token, if logged in.
    pub async fn access_token(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.access_token.clone()
    }

    /// Current refresh token, if logged in.
    pub async fn refresh_token(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.refresh_token.clone()
    }

    /// Email of the signed-in user. Display-only, never used for
    /// authorization.
    pub async fn email(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.email.clone()
    }

    /// Apply a partial update and persist to disk.
    ///
    /// Only the fields present in `update` are written; the rest keep
    /// their stored values.
    pub async fn set(&self, update: SessionUpdate) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(access) = update.access_token {
            state.access_token = Some(access);
        }
        if let Some(refresh) = update.refresh_token {
            state.refresh_token = Some(refresh);
        }
        if let Some(email) = update.email {
            state.email = Some(email);
        }
        debug!("updated session");
        write_atomic(&self.path, &state).await
    }

    /// Remove all three fields unconditionally and persist. Idempotent.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = SessionRecord::default();
        debug!("cleared session");
        write_atomic(&self.path, &state).await
    }
}

/// Write the session record to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target, so a crash mid-write never leaves a truncated file. The
/// file is chmod 0600 since it holds bearer credentials.
async fn write_atomic(path: &Path, record: &SessionRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| Error::Io(format!("serializing session: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("session path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".session.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp session file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting session file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp session file: {e}")))?;

    debug!(path = %path.display(), "persisted session");
    Ok(())
}
