//! Authentication configuration

use super::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Require a bearer token on non-public routes
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Accepted bearer tokens
    #[serde(default)]
    pub api_tokens: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_tokens: Vec::new(),
        }
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.api_tokens.is_empty() {
            return Err("Authentication is enabled but no api_tokens are configured".to_string());
        }
        if self.api_tokens.iter().any(|t| t.trim().is_empty()) {
            return Err("api_tokens cannot contain empty tokens".to_string());
        }
        Ok(())
    }
}

/// Log warnings for configurations that are valid but unsafe
pub fn warn_insecure_config(config: &AuthConfig) {
    if !config.enabled {
        warn!("Authentication is disabled; every route is open");
    }
    if config.api_tokens.iter().any(|t| t.len() < 16) {
        warn!("Some api_tokens are shorter than 16 characters");
    }
}
