//! Session configuration
//!
//! Config precedence: env vars > config file > defaults. The client ID may be
//! supplied through `IGCA_CLIENT_ID` so one config file can serve several
//! deployments of the same page.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::{AUTHORIZE_ENDPOINT, DEFAULT_KEY_PREFIX, STATE_LENGTH, StorageKeys};

/// Implicit-grant client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default = "default_authorize_endpoint")]
    pub authorize_endpoint: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_state_length")]
    pub state_length: usize,
}

fn default_authorize_endpoint() -> String {
    AUTHORIZE_ENDPOINT.to_owned()
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_owned()
}

fn default_state_length() -> usize {
    STATE_LENGTH
}

impl AuthConfig {
    /// Defaults for everything but the client ID.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            scopes: Vec::new(),
            authorize_endpoint: default_authorize_endpoint(),
            key_prefix: default_key_prefix(),
            state_length: default_state_length(),
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_authorize_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.authorize_endpoint = endpoint.into();
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys::with_prefix(&self.key_prefix)
    }

    /// Load configuration from a TOML file, then overlay `IGCA_CLIENT_ID`.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: AuthConfig = toml::from_str(&contents)?;

        if let Ok(client_id) = std::env::var("IGCA_CLIENT_ID") {
            config.client_id = client_id;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the session relies on.
    pub fn validate(&self) -> common::Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(common::Error::Config(
                "client_id must be set in the config file or IGCA_CLIENT_ID".into(),
            ));
        }

        if !self.authorize_endpoint.starts_with("http://")
            && !self.authorize_endpoint.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "authorize_endpoint must start with http:// or https://, got: {}",
                self.authorize_endpoint
            )));
        }

        if self.state_length < STATE_LENGTH {
            return Err(common::Error::Config(format!(
                "state_length must be at least {STATE_LENGTH}, got: {}",
                self.state_length
            )));
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or IGCA_CONFIG env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("IGCA_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("implicit-auth.toml")
    }
}
