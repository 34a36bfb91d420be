//! HTTP middleware implementations
//!
//! This module provides the middleware wrapped around every route:
//! - Request ID tracking
//! - Audit logging
//! - Rate limiting and slow-down
//! - Bearer-token authentication

mod audit;
mod auth;
mod helpers;
mod rate_limit;
mod rate_limiter;
mod request_id;

// Re-export all middleware
pub use audit::{AuditMiddleware, AuditMiddlewareService};
pub use auth::{AuthMiddleware, AuthMiddlewareService};
pub use helpers::{client_identifier, extract_bearer_token, is_bulk_write, is_public_route};
pub use rate_limit::{RateLimitMiddleware, RateLimitMiddlewareService};
pub use rate_limiter::{FixedWindowLimiter, RateLimiter, SlowDown};
pub use request_id::{
    REQUEST_ID_HEADER, RequestId, RequestIdMiddleware, RequestIdMiddlewareService,
    current_request_id,
};
