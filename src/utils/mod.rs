//! Utility modules for the gateway
//!
//! - **error**: top-level error type and its HTTP rendering
//! - **logging**: tracing setup and the audit log

pub mod error;
pub mod logging;
