//! Rate limiting configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Rate limiting configuration
///
/// All windows are fixed and keyed by client address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests allowed per general window
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Failed authentications allowed per auth window
    #[serde(default = "default_auth_max_failures")]
    pub auth_max_failures: u32,
    #[serde(default = "default_window_secs")]
    pub auth_window_secs: u64,
    /// Bulk writes allowed per bulk window
    #[serde(default = "default_bulk_max_requests")]
    pub bulk_max_requests: u32,
    #[serde(default = "default_bulk_window_secs")]
    pub bulk_window_secs: u64,
    /// Requests in the general window before responses are delayed
    #[serde(default = "default_slow_down_after")]
    pub slow_down_after: u32,
    /// Delay for the first request over the threshold
    #[serde(default = "default_slow_down_delay_ms")]
    pub slow_down_delay_ms: u64,
    #[serde(default = "default_slow_down_max_delay_ms")]
    pub slow_down_max_delay_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            auth_max_failures: default_auth_max_failures(),
            auth_window_secs: default_window_secs(),
            bulk_max_requests: default_bulk_max_requests(),
            bulk_window_secs: default_bulk_window_secs(),
            slow_down_after: default_slow_down_after(),
            slow_down_delay_ms: default_slow_down_delay_ms(),
            slow_down_max_delay_ms: default_slow_down_max_delay_ms(),
        }
    }
}

impl RateLimitConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        let limits = [
            ("max_requests", self.max_requests as u64),
            ("window_secs", self.window_secs),
            ("auth_max_failures", self.auth_max_failures as u64),
            ("auth_window_secs", self.auth_window_secs),
            ("bulk_max_requests", self.bulk_max_requests as u64),
            ("bulk_window_secs", self.bulk_window_secs),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(format!("{} cannot be 0", name));
        }
        if self.slow_down_delay_ms > self.slow_down_max_delay_ms {
            return Err("slow_down_delay_ms cannot exceed slow_down_max_delay_ms".to_string());
        }
        Ok(())
    }
}
