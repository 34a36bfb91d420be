//! Backend gateway
//!
//! A [`RecordBackend`] performs exactly one backend call per method
//! invocation: one batch create, one batch update, one batch delete, one
//! record fetch or one list page. It never retries; retry policy belongs to
//! callers, and the bulk writer deliberately has none.
//!
//! ## Implementations
//!
//! - [`HttpRecordBackend`] talks to the hosted record store over HTTPS.
//! - [`InMemoryBackend`] keeps tables in process memory; it backs local
//!   development and the test suite.

mod client;
mod error;
mod memory;

pub use client::HttpRecordBackend;
pub use error::{BackendError, BackendErrorKind, BackendErrorMapper};
pub use memory::InMemoryBackend;

use crate::config::{BackendConfig, BackendProvider};
use crate::core::types::{CreateItem, ListQuery, Record, RecordPage, UpdateItem, WriteOptions};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Hard per-call record limit imposed by the backend
pub const MAX_RECORDS_PER_CALL: usize = 10;

/// One-call-per-method access to a tabular record store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Fetch one page of records
    async fn list_records(&self, table: &str, query: &ListQuery)
    -> std::result::Result<RecordPage, BackendError>;

    /// Fetch a single record by id
    async fn get_record(&self, table: &str, id: &str) -> std::result::Result<Record, BackendError>;

    /// Create up to [`MAX_RECORDS_PER_CALL`] records in one call
    async fn create_records(
        &self,
        table: &str,
        items: &[CreateItem],
        options: WriteOptions,
    ) -> std::result::Result<Vec<Record>, BackendError>;

    /// Partially update up to [`MAX_RECORDS_PER_CALL`] records in one call
    async fn update_records(
        &self,
        table: &str,
        items: &[UpdateItem],
        options: WriteOptions,
    ) -> std::result::Result<Vec<Record>, BackendError>;

    /// Delete up to [`MAX_RECORDS_PER_CALL`] records in one call, returning the deleted ids
    async fn delete_records(
        &self,
        table: &str,
        ids: &[String],
    ) -> std::result::Result<Vec<String>, BackendError>;

    /// Delete a single record
    async fn delete_record(&self, table: &str, id: &str) -> std::result::Result<(), BackendError> {
        let deleted = self.delete_records(table, &[id.to_string()]).await?;
        if deleted.iter().any(|d| d == id) {
            Ok(())
        } else {
            Err(BackendError::record_not_found(
                table,
                format!("Record '{}' was not deleted", id),
            ))
        }
    }
}

/// Build the configured backend
///
/// Called once at startup; the result is shared read-only by every request.
pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn RecordBackend>> {
    match config.provider {
        BackendProvider::Http => {
            info!(base_id = %config.base_id, "Using HTTP record backend");
            Ok(Arc::new(HttpRecordBackend::new(config)?))
        }
        BackendProvider::Memory => {
            info!(tables = ?config.tables, "Using in-memory record backend");
            let backend = InMemoryBackend::new();
            for table in &config.tables {
                backend.create_table(table);
            }
            Ok(Arc::new(backend))
        }
    }
}

pub(crate) fn check_batch_size(len: usize) -> std::result::Result<(), BackendError> {
    if len > MAX_RECORDS_PER_CALL {
        return Err(BackendError::unknown(format!(
            "Batch of {} records exceeds the backend limit of {} per call",
            len, MAX_RECORDS_PER_CALL
        )));
    }
    Ok(())
}
