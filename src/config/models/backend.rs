//! Record store backend configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Which record backend to talk to
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendProvider {
    /// Hosted record store over HTTPS
    #[default]
    Http,
    /// In-process tables, for local development
    Memory,
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub provider: BackendProvider,
    /// API root, without the version segment
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: String,
    /// Identifier of the base holding the tables
    #[serde(default)]
    pub base_id: String,
    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Default for requests that do not say whether to typecast
    #[serde(default)]
    pub typecast: bool,
    /// Tables created at startup by the memory provider
    #[serde(default)]
    pub tables: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: BackendProvider::default(),
            api_base: default_api_base(),
            api_key: String::new(),
            base_id: String::new(),
            timeout: default_timeout(),
            typecast: false,
            tables: Vec::new(),
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout == 0 {
            return Err("Backend timeout cannot be 0".to_string());
        }

        if self.provider == BackendProvider::Memory {
            return Ok(());
        }

        if self.api_base.is_empty() {
            return Err("api_base is required for the http backend".to_string());
        }
        let url = url::Url::parse(&self.api_base)
            .map_err(|e| format!("Invalid api_base '{}': {}", self.api_base, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("api_base must be http(s), got '{}'", url.scheme()));
        }
        if self.api_key.is_empty() {
            return Err("api_key is required for the http backend".to_string());
        }
        if self.base_id.is_empty() {
            return Err("base_id is required for the http backend".to_string());
        }
        Ok(())
    }
}
