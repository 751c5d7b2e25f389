//! API server configuration.

use usecase_core::config::{ConfigError, SharePointSettings};

/// Default listener address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7071";

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:7071").
    pub bind_addr: String,
    /// SharePoint site, credential and list names.
    pub sharepoint: SharePointSettings,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable    | Default          |
    /// |-------------|------------------|
    /// | `BIND_ADDR` | `127.0.0.1:7071` |
    ///
    /// SharePoint variables are documented on [`SharePointSettings::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            sharepoint: SharePointSettings::from_env()?,
        })
    }
}
