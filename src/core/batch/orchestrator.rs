//! Bulk operation orchestrator
//!
//! [`BulkWriter`] sequences one bulk create or update:
//!
//! ```text
//! Idle -> Snapshotting (update only) -> Batching -> PerBatchWrite(1..n)
//!      -> AllCommitted
//!      -> RollingBack -> Failed
//! ```
//!
//! Every transition out of `Snapshotting`, `PerBatchWrite` and `RollingBack`
//! awaits exactly one piece of backend work, so two batches of the same
//! operation are never in flight together. Rollback relies on this: at the
//! moment a batch fails, the committed batches are known exactly.
//!
//! Separate bulk operations share no locks. Two operations touching the same
//! records interleave at the backend and the last write wins per field.
//!
//! Once started, an operation runs until it commits or finishes its rollback
//! pass. Dropping the future mid-operation stops issuing calls but cannot
//! recall one already sent; callers that impose a timeout should run the
//! writer on its own task.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::rollback::RollbackController;
use super::snapshot::{Snapshot, capture_snapshot};
use super::splitter::{MAX_BATCH_SIZE, batch_count, split_batches};
use super::{BulkWriteError, WriteOperation};
use crate::core::backend::{BackendError, RecordBackend};
use crate::core::types::{BulkWriteResponse, CreateItem, Record, UpdateItem, WriteOptions};

/// Progress of a single bulk operation
#[derive(Debug)]
enum BulkPhase {
    Idle,
    Snapshotting,
    Batching,
    /// Writing the batch at this 0-based index
    PerBatchWrite {
        batch: usize,
    },
    RollingBack {
        /// 1-based index of the batch that failed
        failed_batch: usize,
        error: BackendError,
    },
    AllCommitted,
    Failed(BulkWriteError),
}

/// What the committed batches have written so far
#[derive(Debug, Default)]
struct OperationOutcome {
    records: Vec<Record>,
    /// Distinct ids in first-commit order
    written_ids: Vec<String>,
    seen: HashSet<String>,
}

impl OperationOutcome {
    fn commit(&mut self, records: Vec<Record>) {
        for record in &records {
            if self.seen.insert(record.id.clone()) {
                self.written_ids.push(record.id.clone());
            }
        }
        self.records.extend(records);
    }
}

/// A write item kind the orchestrator knows how to batch and undo
#[async_trait]
trait BatchWrite: Sized + Sync {
    const OPERATION: WriteOperation;

    /// Capture whatever rollback needs before the first write
    async fn prepare(
        _backend: &dyn RecordBackend,
        _table: &str,
        _items: &[Self],
    ) -> Result<Snapshot, BulkWriteError> {
        Ok(Snapshot::default())
    }

    async fn write_batch(
        backend: &dyn RecordBackend,
        table: &str,
        batch: &[Self],
        options: WriteOptions,
    ) -> Result<Vec<Record>, BackendError>;
}

#[async_trait]
impl BatchWrite for CreateItem {
    const OPERATION: WriteOperation = WriteOperation::Create;

    async fn write_batch(
        backend: &dyn RecordBackend,
        table: &str,
        batch: &[Self],
        options: WriteOptions,
    ) -> Result<Vec<Record>, BackendError> {
        backend.create_records(table, batch, options).await
    }
}

#[async_trait]
impl BatchWrite for UpdateItem {
    const OPERATION: WriteOperation = WriteOperation::Update;

    async fn prepare(
        backend: &dyn RecordBackend,
        table: &str,
        items: &[Self],
    ) -> Result<Snapshot, BulkWriteError> {
        capture_snapshot(backend, table, items).await
    }

    async fn write_batch(
        backend: &dyn RecordBackend,
        table: &str,
        batch: &[Self],
        options: WriteOptions,
    ) -> Result<Vec<Record>, BackendError> {
        backend.update_records(table, batch, options).await
    }
}

/// Entry point for batched bulk writes with compensating rollback
#[derive(Clone)]
pub struct BulkWriter {
    backend: Arc<dyn RecordBackend>,
}

impl BulkWriter {
    pub fn new(backend: Arc<dyn RecordBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn RecordBackend> {
        &self.backend
    }

    /// Create `items` in order, ten per backend call
    ///
    /// On a mid-operation failure every record created by earlier batches is
    /// deleted again before the error is returned.
    pub async fn create_records(
        &self,
        table: &str,
        items: &[CreateItem],
        options: WriteOptions,
    ) -> Result<BulkWriteResponse, BulkWriteError> {
        self.run(table, items, options).await
    }

    /// Partially update `items` in order, ten per backend call
    ///
    /// The fields about to change are read first; if any read fails nothing
    /// is written. On a mid-operation failure the earlier batches are
    /// restored from those values.
    pub async fn update_records(
        &self,
        table: &str,
        items: &[UpdateItem],
        options: WriteOptions,
    ) -> Result<BulkWriteResponse, BulkWriteError> {
        self.run(table, items, options).await
    }

    async fn run<T: BatchWrite + Send>(
        &self,
        table: &str,
        items: &[T],
        options: WriteOptions,
    ) -> Result<BulkWriteResponse, BulkWriteError> {
        let backend = self.backend.as_ref();
        let operation = T::OPERATION;
        let total_batches = batch_count(items.len(), MAX_BATCH_SIZE);

        let mut snapshot = Snapshot::default();
        let mut batches: Vec<&[T]> = Vec::new();
        let mut outcome = OperationOutcome::default();
        let mut phase = BulkPhase::Idle;

        loop {
            phase = match phase {
                BulkPhase::Idle => {
                    if items.is_empty() {
                        BulkPhase::AllCommitted
                    } else {
                        info!(
                            table,
                            operation = %operation,
                            records = items.len(),
                            batches = total_batches,
                            backend = backend.name(),
                            "Starting bulk write"
                        );
                        BulkPhase::Snapshotting
                    }
                }

                BulkPhase::Snapshotting => match T::prepare(backend, table, items).await {
                    Ok(captured) => {
                        snapshot = captured;
                        BulkPhase::Batching
                    }
                    Err(e) => BulkPhase::Failed(e),
                },

                BulkPhase::Batching => match split_batches(items, MAX_BATCH_SIZE) {
                    Ok(split) => {
                        batches = split;
                        BulkPhase::PerBatchWrite { batch: 0 }
                    }
                    Err(e) => BulkPhase::Failed(e),
                },

                BulkPhase::PerBatchWrite { batch } if batch >= batches.len() => {
                    BulkPhase::AllCommitted
                }

                BulkPhase::PerBatchWrite { batch } => {
                    let current = batches[batch];
                    match T::write_batch(backend, table, current, options).await {
                        Ok(records) => {
                            debug!(
                                table,
                                batch = batch + 1,
                                of = total_batches,
                                records = records.len(),
                                "Batch committed"
                            );
                            outcome.commit(records);
                            BulkPhase::PerBatchWrite { batch: batch + 1 }
                        }
                        Err(error) => BulkPhase::RollingBack {
                            failed_batch: batch + 1,
                            error,
                        },
                    }
                }

                BulkPhase::RollingBack {
                    failed_batch,
                    error,
                } => {
                    let composite = RollbackController::new(backend, table)
                        .rollback(
                            operation,
                            &snapshot,
                            &outcome.written_ids,
                            error,
                            failed_batch,
                            total_batches,
                        )
                        .await;
                    BulkPhase::Failed(composite.into())
                }

                BulkPhase::AllCommitted => {
                    let records = std::mem::take(&mut outcome.records);
                    if !records.is_empty() {
                        info!(
                            table,
                            operation = %operation,
                            records = records.len(),
                            "Bulk write committed"
                        );
                    }
                    return Ok(BulkWriteResponse::new(records));
                }

                BulkPhase::Failed(e) => return Err(e),
            };
        }
    }
}
