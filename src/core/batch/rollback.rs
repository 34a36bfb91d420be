//! Compensating rollback
//!
//! Undoes the batches that committed before a failure: created records are
//! deleted, updated records get their snapshotted values written back. There
//! is exactly one pass and no retry; the first compensating call that fails
//! ends the pass and the operation is reported as unrestored.
//!
//! Restores are plain writes. If another client changed a record between the
//! original write and the restore, the restore overwrites that change; the
//! backend offers no version token to detect it.

use tracing::{error, info, warn};

use super::snapshot::Snapshot;
use super::splitter::MAX_BATCH_SIZE;
use super::{CompositeError, RollbackOutcome, WriteOperation};
use crate::core::backend::{BackendError, RecordBackend};
use crate::core::types::WriteOptions;

/// Issues compensating calls for one failed bulk operation
pub struct RollbackController<'a> {
    backend: &'a dyn RecordBackend,
    table: &'a str,
}

impl<'a> RollbackController<'a> {
    pub fn new(backend: &'a dyn RecordBackend, table: &'a str) -> Self {
        Self { backend, table }
    }

    /// Delete every record created so far, in creation order
    pub async fn undo_creates(&self, created_ids: &[String]) -> RollbackOutcome {
        if created_ids.is_empty() {
            return RollbackOutcome::nothing_to_undo();
        }

        warn!(
            table = self.table,
            records = created_ids.len(),
            "Rolling back created records"
        );

        let mut compensated = 0;
        for batch in created_ids.chunks(MAX_BATCH_SIZE) {
            match self.backend.delete_records(self.table, batch).await {
                Ok(deleted) => {
                    let confirmed = confirmed_count(batch, &deleted);
                    compensated += confirmed;
                    if confirmed < batch.len() {
                        let error = unconfirmed("deletion", confirmed, batch.len());
                        return self.failed(compensated, error);
                    }
                }
                Err(e) => return self.failed(compensated, e),
            }
        }

        RollbackOutcome {
            attempted: true,
            succeeded: true,
            compensated,
            error: None,
        }
    }

    /// Write snapshotted values back onto every record updated so far
    pub async fn undo_updates(&self, snapshot: &Snapshot, updated_ids: &[String]) -> RollbackOutcome {
        if updated_ids.is_empty() {
            return RollbackOutcome::nothing_to_undo();
        }

        // Records that only gained new columns have nothing to write back
        let restores = snapshot.restore_items(updated_ids);

        warn!(
            table = self.table,
            records = restores.len(),
            "Restoring updated records from snapshot"
        );

        let mut compensated = 0;
        for batch in restores.chunks(MAX_BATCH_SIZE) {
            // Restored values are verbatim backend values; no coercion wanted
            match self
                .backend
                .update_records(self.table, batch, WriteOptions::default())
                .await
            {
                Ok(restored) => {
                    let restored: Vec<String> = restored.into_iter().map(|r| r.id).collect();
                    let ids: Vec<String> = batch.iter().map(|item| item.id.clone()).collect();
                    let confirmed = confirmed_count(&ids, &restored);
                    compensated += confirmed;
                    if confirmed < batch.len() {
                        let error = unconfirmed("restore", confirmed, batch.len());
                        return self.failed(compensated, error);
                    }
                }
                Err(e) => return self.failed(compensated, e),
            }
        }

        RollbackOutcome {
            attempted: true,
            succeeded: true,
            compensated,
            error: None,
        }
    }

    /// Run the compensating pass for `operation` and build the final error
    ///
    /// `written_ids` are the ids of every record the committed batches wrote.
    pub async fn rollback(
        &self,
        operation: WriteOperation,
        snapshot: &Snapshot,
        written_ids: &[String],
        original: BackendError,
        failed_batch: usize,
        total_batches: usize,
    ) -> CompositeError {
        let outcome = match operation {
            WriteOperation::Create => self.undo_creates(written_ids).await,
            WriteOperation::Update => self.undo_updates(snapshot, written_ids).await,
        };

        let composite = CompositeError::from_rollback(
            operation,
            self.table,
            original,
            failed_batch,
            total_batches,
            written_ids,
            outcome,
        );

        if composite.rollback_succeeded() {
            info!(
                table = self.table,
                operation = %operation,
                failed_batch,
                "Bulk write failed; backend state restored"
            );
        } else {
            error!(
                table = self.table,
                operation = %operation,
                failed_batch,
                affected = composite.affected_count(),
                affected_ids = ?composite.affected_ids(),
                "Rollback failed; records require manual remediation"
            );
        }

        composite
    }

    fn failed(&self, compensated: usize, error: BackendError) -> RollbackOutcome {
        warn!(
            table = self.table,
            compensated,
            error = %error,
            "Compensating call failed, stopping rollback"
        );
        RollbackOutcome {
            attempted: true,
            succeeded: false,
            compensated,
            error: Some(error),
        }
    }
}

/// How many of `requested` the backend reported back
fn confirmed_count(requested: &[String], reported: &[String]) -> usize {
    requested.iter().filter(|id| reported.contains(id)).count()
}

fn unconfirmed(what: &str, confirmed: usize, requested: usize) -> BackendError {
    BackendError::unknown(format!(
        "Backend confirmed {} of {} records in a compensating {}",
        confirmed, requested, what
    ))
}
