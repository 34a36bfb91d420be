//! Application state shared across HTTP handlers

use crate::config::Config;
use crate::core::backend::{RecordBackend, create_backend};
use crate::core::batch::BulkWriter;
use crate::server::middleware::RateLimiter;
use crate::utils::error::Result;
use crate::utils::logging::AuditLogger;
use std::sync::Arc;

/// HTTP server state shared across handlers
///
/// Everything here is built once at startup and shared read-only; the only
/// mutable state lives inside the rate limiter's windows.
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration (shared read-only)
    pub config: Arc<Config>,
    /// Record store used for single-record calls
    pub backend: Arc<dyn RecordBackend>,
    /// Bulk create/update engine over the same backend
    pub writer: BulkWriter,
    /// Request, bulk-write and auth-failure windows
    pub limiter: Arc<RateLimiter>,
    /// Background audit sink, absent when auditing is disabled
    pub audit: Option<Arc<AuditLogger>>,
}

impl AppState {
    /// Build state with the backend named in the configuration
    ///
    /// Must be called inside a Tokio runtime when auditing is enabled.
    pub fn new(config: Config) -> Result<Self> {
        let backend = create_backend(config.backend())?;
        Ok(Self::with_backend(config, backend))
    }

    /// Build state around an existing backend
    pub fn with_backend(config: Config, backend: Arc<dyn RecordBackend>) -> Self {
        let limiter = Arc::new(RateLimiter::from_config(config.rate_limit()));
        let audit = config
            .audit()
            .enabled
            .then(|| Arc::new(AuditLogger::new(config.audit().buffer_size)));

        Self {
            writer: BulkWriter::new(Arc::clone(&backend)),
            config: Arc::new(config),
            backend,
            limiter,
            audit,
        }
    }

    /// Replace the audit sink, e.g. with one whose receiver a test drains
    pub fn with_audit_logger(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(Arc::new(logger));
        self
    }

    /// Whether `token` is one of the configured API tokens
    pub fn is_valid_token(&self, token: &str) -> bool {
        self.config
            .auth()
            .api_tokens
            .iter()
            .any(|candidate| candidate == token)
    }
}
