//! Environment overrides
//!
//! Every `TABLEGATE_*` variable overrides the matching file setting. Lists
//! (`TABLEGATE_API_TOKENS`, `TABLEGATE_TABLES`) are comma separated.

use super::models::*;
use crate::utils::error::{GatewayError, Result};
use std::env;
use std::str::FromStr;
use tracing::debug;

fn parse<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| GatewayError::Config(format!("Invalid {}: {}", name, e)))
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl GatewayConfig {
    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server configuration
        if let Some(host) = lookup("TABLEGATE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("TABLEGATE_PORT") {
            self.server.port = parse("TABLEGATE_PORT", &port)?;
        }
        if let Some(workers) = lookup("TABLEGATE_WORKERS") {
            self.server.workers = Some(parse("TABLEGATE_WORKERS", &workers)?);
        }
        if let Some(timeout) = lookup("TABLEGATE_TIMEOUT") {
            self.server.timeout = parse("TABLEGATE_TIMEOUT", &timeout)?;
        }
        if let Some(max) = lookup("TABLEGATE_MAX_BULK_RECORDS") {
            self.server.max_bulk_records = parse("TABLEGATE_MAX_BULK_RECORDS", &max)?;
        }

        // Backend configuration
        if let Some(provider) = lookup("TABLEGATE_BACKEND") {
            self.backend.provider = match provider.trim().to_ascii_lowercase().as_str() {
                "http" => BackendProvider::Http,
                "memory" => BackendProvider::Memory,
                other => {
                    return Err(GatewayError::Config(format!(
                        "Invalid TABLEGATE_BACKEND: unknown provider '{}'",
                        other
                    )));
                }
            };
        }
        if let Some(api_base) = lookup("TABLEGATE_API_BASE") {
            self.backend.api_base = api_base;
        }
        if let Some(api_key) = lookup("TABLEGATE_API_KEY") {
            self.backend.api_key = api_key;
        }
        if let Some(base_id) = lookup("TABLEGATE_BASE_ID") {
            self.backend.base_id = base_id;
        }
        if let Some(timeout) = lookup("TABLEGATE_BACKEND_TIMEOUT") {
            self.backend.timeout = parse("TABLEGATE_BACKEND_TIMEOUT", &timeout)?;
        }
        if let Some(tables) = lookup("TABLEGATE_TABLES") {
            self.backend.tables = parse_list(&tables);
        }

        // Auth configuration
        if let Some(enabled) = lookup("TABLEGATE_AUTH_ENABLED") {
            self.auth.enabled = parse("TABLEGATE_AUTH_ENABLED", &enabled)?;
        }
        if let Some(tokens) = lookup("TABLEGATE_API_TOKENS") {
            self.auth.api_tokens = parse_list(&tokens);
        }

        // Rate limiting, audit and logging
        if let Some(enabled) = lookup("TABLEGATE_RATE_LIMIT_ENABLED") {
            self.rate_limit.enabled = parse("TABLEGATE_RATE_LIMIT_ENABLED", &enabled)?;
        }
        if let Some(enabled) = lookup("TABLEGATE_AUDIT_ENABLED") {
            self.audit.enabled = parse("TABLEGATE_AUDIT_ENABLED", &enabled)?;
        }
        if let Some(level) = lookup("TABLEGATE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("TABLEGATE_LOG_JSON") {
            self.logging.json = parse("TABLEGATE_LOG_JSON", &json)?;
        }

        debug!("Applied environment overrides");
        Ok(())
    }
}
