//! Error handling for the gateway
//!
//! This module defines the top-level error type and its HTTP rendering. Every
//! variant maps to a stable `code` and a human-readable `message` so that the
//! audit log can classify failures without inspecting bodies.

use crate::core::backend::BackendError;
use crate::core::batch::BulkWriteError;
use crate::server::middleware::current_request_id;
use actix_web::http::StatusCode;
use actix_web::http::header::RETRY_AFTER;
use actix_web::{HttpResponse, ResponseError};
use serde_json::Value;
use thiserror::Error;

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or rejected credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded: {message}")]
    RateLimit { message: String, retry_after: u64 },

    /// Request failed boundary validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown route or resource
    #[error("Not found: {0}")]
    NotFound(String),

    /// Single-record backend call failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Bulk create or update failed
    #[error(transparent)]
    BulkWrite(#[from] BulkWriteError),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Stable error code reported to clients and the audit log
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::Yaml(_) => "CONFIG_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::RateLimit { .. } => "RATE_LIMIT_EXCEEDED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Backend(e) => e.code(),
            Self::BulkWrite(e) => e.code(),
            Self::Timeout(_) => "TIMEOUT",
            Self::HttpClient(_) | Self::Serialization(_) | Self::Io(_) | Self::Internal(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        let status = match self {
            Self::Unauthorized(_) => 401,
            Self::RateLimit { .. } => 429,
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Backend(e) => e.http_status(),
            Self::BulkWrite(e) => e.http_status(),
            Self::Timeout(_) => 504,
            _ => 500,
        };
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Message safe to return to clients
    pub fn public_message(&self) -> String {
        match self {
            Self::HttpClient(_) | Self::Serialization(_) | Self::Io(_) => {
                "An internal error occurred".to_string()
            }
            Self::Backend(e) => e.message().to_string(),
            _ => self.to_string(),
        }
    }

    /// Structured context for rollback-aware failures
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::BulkWrite(e) => e.details(),
            _ => None,
        }
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.public_message(),
                details: self.details(),
                timestamp: chrono::Utc::now().timestamp(),
                request_id: current_request_id(),
            },
        };

        let mut builder = HttpResponse::build(self.status());
        if let Self::RateLimit { retry_after, .. } = self {
            builder.insert_header((RETRY_AFTER, retry_after.to_string()));
        }
        builder.json(error_response)
    }
}

/// Standard error response format
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub timestamp: i64,
    pub request_id: Option<String>,
}

/// Helper functions for creating specific errors
impl GatewayError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn rate_limit<S: Into<String>>(message: S, retry_after: u64) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }
}
