//! Configuration data models
//!
//! This module defines all configuration structures used throughout the gateway.

pub mod audit;
pub mod auth;
pub mod backend;
pub mod gateway;
pub mod logging;
pub mod rate_limit;
pub mod server;

// Re-export all configuration types
pub use audit::*;
pub use auth::*;
pub use backend::*;
pub use gateway::*;
pub use logging::*;
pub use rate_limit::*;
pub use server::*;

/// Default values for configuration
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub fn default_port() -> u16 {
    8000
}

/// Default timeout in seconds
pub fn default_timeout() -> u64 {
    30
}

/// Default maximum body size in bytes
pub fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

/// Most records accepted by one bulk request
pub fn default_max_bulk_records() -> usize {
    1000
}

pub fn default_api_base() -> String {
    "https://api.airtable.com".to_string()
}

pub fn default_true() -> bool {
    true
}

/// General window: requests per window
pub fn default_max_requests() -> u32 {
    100
}

/// 15 minutes
pub fn default_window_secs() -> u64 {
    900
}

pub fn default_auth_max_failures() -> u32 {
    5
}

pub fn default_bulk_max_requests() -> u32 {
    20
}

/// One hour
pub fn default_bulk_window_secs() -> u64 {
    3600
}

pub fn default_slow_down_after() -> u32 {
    50
}

pub fn default_slow_down_delay_ms() -> u64 {
    500
}

pub fn default_slow_down_max_delay_ms() -> u64 {
    20_000
}

pub fn default_audit_buffer_size() -> usize {
    1024
}

pub fn default_log_level() -> String {
    "info".to_string()
}
