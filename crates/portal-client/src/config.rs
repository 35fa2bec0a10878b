//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! `PORTAL_API_BASE` overrides the configured base address the same way
//! the web client honored `VITE_API_BASE`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
}

/// Portal API settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    /// Base address all relative request paths resolve against
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Session persistence settings
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    /// Path of the JSON file holding the token pair and email
    pub token_file: PathBuf,
}

fn default_timeout() -> u64 {
    30
}

impl ClientConfig {
    /// Load configuration from a TOML file, then overlay environment
    /// variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: ClientConfig = toml::from_str(&contents)?;

        if let Ok(base) = std::env::var("PORTAL_API_BASE") {
            config.api.base_url = base;
        }

        if !config.api.base_url.starts_with("http://")
            && !config.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "api.base_url must start with http:// or https://, got: {}",
                config.api.base_url
            )));
        }

        if config.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "api.timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(config)
    }

    /// Resolve the config file path from a CLI arg or the PORTAL_CONFIG
    /// env var, falling back to the default file name.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("PORTAL_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("aptiv-portal.toml")
    }
}
