//! Logging setup and the asynchronous audit log
//!
//! Audit entries are handed to a bounded channel and written by a background
//! task, so recording one never blocks the response. When the channel is full
//! the entry is dropped and counted rather than waited on.

use crate::config::LoggingConfig;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level. Calling this twice is harmless;
/// the second call is ignored.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_ids(false);

    let result = if config.json {
        builder.json().with_current_span(false).try_init()
    } else {
        builder.with_target(true).try_init()
    };

    if result.is_err() {
        warn!("Tracing subscriber already installed");
    }
}

/// One audited request
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuditEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub request_id: Option<String>,
    pub method: String,
    pub path: String,
    pub elapsed_ms: u64,
    pub status: u16,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Non-blocking audit log writer
pub struct AuditLogger {
    sender: mpsc::Sender<AuditEntry>,
    dropped: AtomicU64,
}

impl AuditLogger {
    /// Create a logger whose entries are written to the `audit` tracing target
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(buffer_size: usize) -> Self {
        let (logger, mut receiver) = Self::channel(buffer_size);

        tokio::spawn(async move {
            while let Some(entry) = receiver.recv().await {
                write_entry(&entry);
            }
        });

        logger
    }

    /// Create a logger and hand back the receiving end instead of spawning a writer
    pub fn channel(buffer_size: usize) -> (Self, mpsc::Receiver<AuditEntry>) {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let logger = Self {
            sender,
            dropped: AtomicU64::new(0),
        };
        (logger, receiver)
    }

    /// Queue an entry; returns false if it had to be dropped
    pub fn record(&self, entry: AuditEntry) -> bool {
        match self.sender.try_send(entry) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(dropped, "Audit buffer full, entry dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("Audit channel closed");
                false
            }
        }
    }

    /// Entries dropped because the buffer was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

fn write_entry(entry: &AuditEntry) {
    if entry.success {
        info!(
            target: "audit",
            request_id = entry.request_id.as_deref(),
            method = %entry.method,
            path = %entry.path,
            elapsed_ms = entry.elapsed_ms,
            status = entry.status,
            success = true,
            "request completed"
        );
    } else {
        warn!(
            target: "audit",
            request_id = entry.request_id.as_deref(),
            method = %entry.method,
            path = %entry.path,
            elapsed_ms = entry.elapsed_ms,
            status = entry.status,
            success = false,
            error_code = entry.error_code.as_deref(),
            error_message = entry.error_message.as_deref(),
            "request failed"
        );
    }
}
