//! Bulk write errors
//!
//! A failed bulk operation reports one of three things: rollback could not
//! be prepared (nothing was written), a batch failed and every earlier batch
//! was undone, or a batch failed and undoing earlier batches failed too. The
//! last case leaves the backend in a mixed state and its message always names
//! how many records need manual attention.

use serde_json::{Value, json};

use crate::core::backend::BackendError;

/// Which bulk entry point failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    Create,
    Update,
}

impl WriteOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

impl std::fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Taxonomy of bulk failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkErrorKind {
    /// Snapshot capture failed; no write was attempted
    RollbackUnsupported,
    /// A batch failed; everything written before it was undone
    PartialFailureRestored,
    /// A batch failed and undoing earlier batches failed as well
    PartialFailureUnrestored,
    /// Caller passed an unusable batch size
    InvalidBatchSize,
}

/// Result of the single compensating pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackOutcome {
    /// Whether there were written records to compensate
    pub attempted: bool,
    pub succeeded: bool,
    /// Records whose compensation was confirmed by the backend
    pub compensated: usize,
    /// The compensating call failure that ended the pass
    pub error: Option<BackendError>,
}

impl RollbackOutcome {
    /// Nothing had been written, so there was nothing to undo
    pub fn nothing_to_undo() -> Self {
        Self {
            attempted: false,
            succeeded: true,
            compensated: 0,
            error: None,
        }
    }
}

/// A write failure combined with the outcome of rolling back
///
/// Built once, when the first batch fails, and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeError {
    operation: WriteOperation,
    table: String,
    original: BackendError,
    /// 1-based index of the failing batch
    failed_batch: usize,
    total_batches: usize,
    rollback: RollbackOutcome,
    /// Distinct records committed before the failing batch
    written_count: usize,
    /// Records written before the failure that are still modified
    affected_ids: Vec<String>,
}

impl CompositeError {
    /// Fold a rollback outcome into the error reported for `original`
    ///
    /// `written_ids` are the records committed before the failing batch.
    pub fn from_rollback(
        operation: WriteOperation,
        table: impl Into<String>,
        original: BackendError,
        failed_batch: usize,
        total_batches: usize,
        written_ids: &[String],
        rollback: RollbackOutcome,
    ) -> Self {
        let affected_ids = if rollback.succeeded {
            Vec::new()
        } else {
            written_ids.to_vec()
        };

        Self {
            operation,
            table: table.into(),
            original,
            failed_batch,
            total_batches,
            rollback,
            written_count: written_ids.len(),
            affected_ids,
        }
    }

    pub fn operation(&self) -> WriteOperation {
        self.operation
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The write error that triggered rollback
    pub fn original_error(&self) -> &BackendError {
        &self.original
    }

    pub fn failed_batch(&self) -> usize {
        self.failed_batch
    }

    pub fn total_batches(&self) -> usize {
        self.total_batches
    }

    pub fn rollback_attempted(&self) -> bool {
        self.rollback.attempted
    }

    pub fn rollback_succeeded(&self) -> bool {
        self.rollback.succeeded
    }

    /// Records left in a modified state; zero when rollback succeeded
    pub fn affected_count(&self) -> usize {
        self.affected_ids.len()
    }

    pub fn affected_ids(&self) -> &[String] {
        &self.affected_ids
    }

    /// The compensating call failure, if rollback failed
    pub fn rollback_error(&self) -> Option<&BackendError> {
        self.rollback.error.as_ref()
    }

    pub fn kind(&self) -> BulkErrorKind {
        if self.rollback.succeeded {
            BulkErrorKind::PartialFailureRestored
        } else {
            BulkErrorKind::PartialFailureUnrestored
        }
    }

    /// A restored failure keeps the original error's code
    pub fn code(&self) -> &'static str {
        if self.rollback.succeeded {
            self.original.code()
        } else {
            "PARTIAL_FAILURE_UNRESTORED"
        }
    }

    pub fn http_status(&self) -> u16 {
        if self.rollback.succeeded {
            self.original.http_status()
        } else {
            500
        }
    }

    pub fn details(&self) -> Value {
        let mut details = json!({
            "operation": self.operation.as_str(),
            "table": self.table,
            "failedBatch": self.failed_batch,
            "totalBatches": self.total_batches,
            "rollbackAttempted": self.rollback.attempted,
            "rollbackSucceeded": self.rollback.succeeded,
            "affectedCount": self.affected_count(),
            "affectedRecordIds": self.affected_ids,
            "originalError": {
                "code": self.original.code(),
                "message": self.original.message(),
            },
        });
        if let Some(error) = &self.rollback.error {
            details["rollbackError"] = json!({
                "code": error.code(),
                "message": error.message(),
            });
        }
        details
    }
}

impl std::fmt::Display for CompositeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.rollback.succeeded {
            write!(
                f,
                "{} (batch {} of {} failed; ",
                self.original, self.failed_batch, self.total_batches
            )?;
            if self.written_count == 0 {
                f.write_str("no records were written)")
            } else {
                write!(
                    f,
                    "{} previously written records were rolled back)",
                    self.written_count
                )
            }
        } else {
            write!(
                f,
                "Bulk {} on table '{}' failed at batch {} of {} and rollback did not complete: {}. \
                 {} records were left modified and require manual remediation. Original error: {}",
                self.operation,
                self.table,
                self.failed_batch,
                self.total_batches,
                self.rollback
                    .error
                    .as_ref()
                    .map_or_else(|| "unknown rollback failure".to_string(), |e| e.to_string()),
                self.affected_count(),
                self.original
            )
        }
    }
}

impl std::error::Error for CompositeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.original)
    }
}

/// Error returned by the bulk entry points
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BulkWriteError {
    #[error("Cannot prepare rollback: reading record '{record_id}' failed: {source}")]
    RollbackUnsupported {
        record_id: String,
        #[source]
        source: BackendError,
    },

    #[error(transparent)]
    PartialFailure(#[from] CompositeError),

    #[error("Batch size must be at least 1, got {0}")]
    InvalidBatchSize(usize),
}

impl BulkWriteError {
    pub fn kind(&self) -> BulkErrorKind {
        match self {
            Self::RollbackUnsupported { .. } => BulkErrorKind::RollbackUnsupported,
            Self::PartialFailure(composite) => composite.kind(),
            Self::InvalidBatchSize(_) => BulkErrorKind::InvalidBatchSize,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::RollbackUnsupported { .. } => "ROLLBACK_UNSUPPORTED",
            Self::PartialFailure(composite) => composite.code(),
            Self::InvalidBatchSize(_) => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::RollbackUnsupported { .. } | Self::InvalidBatchSize(_) => 500,
            Self::PartialFailure(composite) => composite.http_status(),
        }
    }

    pub fn details(&self) -> Option<Value> {
        match self {
            Self::RollbackUnsupported { record_id, source } => Some(json!({
                "recordId": record_id,
                "writesAttempted": 0,
                "cause": {"code": source.code(), "message": source.message()},
            })),
            Self::PartialFailure(composite) => Some(composite.details()),
            Self::InvalidBatchSize(_) => None,
        }
    }

    pub fn composite(&self) -> Option<&CompositeError> {
        match self {
            Self::PartialFailure(composite) => Some(composite),
            _ => None,
        }
    }
}
