//! Bulk update integration tests
//!
//! Snapshot capture, batching and snapshot-based restore.

#[cfg(test)]
mod tests {
    use crate::common::assertions::BulkWriteErrorAssertions;
    use crate::common::fixtures::{
        create_items, fields, ids, invalid_field, server_error, status_updates,
    };
    use crate::common::{BackendCall, FlakyBackend};
    use serde_json::json;
    use std::sync::Arc;
    use tablegate::core::batch::{BulkErrorKind, BulkWriteError, BulkWriter, WriteOperation};
    use tablegate::core::types::{CreateItem, Record, UpdateItem, WriteOptions};

    /// Seed `count` records whose `Status` is `todo`
    async fn seeded(count: usize) -> (Arc<FlakyBackend>, Vec<Record>) {
        let backend = Arc::new(FlakyBackend::with_tables(&["Tasks"]));
        let items: Vec<CreateItem> = create_items(count)
            .into_iter()
            .map(|mut item| {
                item.fields.insert("Status".to_string(), json!("todo"));
                item
            })
            .collect();
        let response = BulkWriter::new(backend.clone())
            .create_records("Tasks", &items, WriteOptions::default())
            .await
            .unwrap();
        backend.reset_calls();
        (backend, response.records)
    }

    fn statuses(backend: &FlakyBackend) -> Vec<String> {
        backend
            .store()
            .records("Tasks")
            .iter()
            .map(|r| r.fields["Status"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_update_reads_then_writes_in_batches() {
        let (backend, records) = seeded(25).await;

        let response = BulkWriter::new(backend.clone())
            .update_records("Tasks", &status_updates(&records, "done"), WriteOptions::default())
            .await
            .unwrap();

        assert_eq!(response.count, 25);
        assert_eq!(ids(&response.records), ids(&records));
        assert!(statuses(&backend).iter().all(|s| s == "done"));

        let calls = backend.calls();
        assert!(calls[..25].iter().all(|c| matches!(c, BackendCall::Get(_))));
        let batch_sizes: Vec<usize> = backend.update_calls().iter().map(Vec::len).collect();
        assert_eq!(batch_sizes, vec![10, 10, 5]);
    }

    #[tokio::test]
    async fn test_update_failure_restores_snapshot() {
        let (backend, records) = seeded(25).await;
        backend.fail_update_call(3, invalid_field("Tasks"));

        let err = BulkWriter::new(backend.clone())
            .update_records("Tasks", &status_updates(&records, "done"), WriteOptions::default())
            .await
            .unwrap_err();

        err.assert_restored();
        let composite = err.composite_or_panic();
        assert_eq!(composite.operation(), WriteOperation::Update);
        assert_eq!(composite.failed_batch(), 3);
        assert_eq!(err.code(), "INVALID_FIELD_DATA");

        assert!(statuses(&backend).iter().all(|s| s == "todo"));

        // Three forward calls, then the restores for the 20 committed records
        let updates = backend.update_calls();
        assert_eq!(updates.len(), 5);
        assert_eq!(updates[3], ids(&records[..10]));
        assert_eq!(updates[4], ids(&records[10..20]));
    }

    #[tokio::test]
    async fn test_restore_leaves_untouched_fields_alone() {
        let (backend, records) = seeded(12).await;
        backend.fail_update_call(2, server_error());

        let items: Vec<UpdateItem> = records
            .iter()
            .map(|r| UpdateItem::new(r.id.clone(), fields(&[("Name", json!("renamed"))])))
            .collect();
        let err = BulkWriter::new(backend.clone())
            .update_records("Tasks", &items, WriteOptions::default())
            .await
            .unwrap_err();
        err.assert_restored();

        let restored = backend.store().records("Tasks");
        for (before, after) in records.iter().zip(&restored) {
            assert_eq!(before.fields, after.fields);
        }
    }

    #[tokio::test]
    async fn test_snapshot_failure_writes_nothing() {
        let (backend, records) = seeded(15).await;
        backend.fail_get(&records[12].id);

        let err = BulkWriter::new(backend.clone())
            .update_records("Tasks", &status_updates(&records, "done"), WriteOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), BulkErrorKind::RollbackUnsupported);
        assert_eq!(err.code(), "ROLLBACK_UNSUPPORTED");
        match &err {
            BulkWriteError::RollbackUnsupported { record_id, .. } => {
                assert_eq!(record_id, &records[12].id)
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(backend.update_calls().is_empty());
        assert!(statuses(&backend).iter().all(|s| s == "todo"));
    }

    #[tokio::test]
    async fn test_missing_record_aborts_before_writing() {
        let (backend, records) = seeded(3).await;
        let mut items = status_updates(&records, "done");
        items.push(UpdateItem::new("recDoesNotExist", fields(&[("Status", json!("done"))])));

        let err = BulkWriter::new(backend.clone())
            .update_records("Tasks", &items, WriteOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), BulkErrorKind::RollbackUnsupported);
        assert!(backend.update_calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_restore_reports_every_updated_record() {
        let (backend, records) = seeded(22).await;
        backend.fail_update_call(3, server_error());
        backend.fail_update_call(4, server_error());

        let err = BulkWriter::new(backend.clone())
            .update_records("Tasks", &status_updates(&records, "done"), WriteOptions::default())
            .await
            .unwrap_err();

        err.assert_unrestored(20);
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.composite_or_panic().affected_ids(), ids(&records[..20]).as_slice());

        let details = err.details().unwrap();
        assert_eq!(details["affectedCount"], 20);
        assert_eq!(details["rollbackSucceeded"], false);
    }

    #[tokio::test]
    async fn test_duplicate_ids_restored_once() {
        let (backend, records) = seeded(11).await;
        backend.fail_update_call(2, server_error());

        // The first record appears in both batches' worth of items
        let mut items = status_updates(&records[..10], "done");
        items.push(UpdateItem::new(records[0].id.clone(), fields(&[("Status", json!("again"))])));

        let err = BulkWriter::new(backend.clone())
            .update_records("Tasks", &items, WriteOptions::default())
            .await
            .unwrap_err();
        err.assert_restored();

        let gets = backend
            .calls()
            .into_iter()
            .filter(|c| matches!(c, BackendCall::Get(_)))
            .count();
        assert_eq!(gets, 10);
        assert!(statuses(&backend).iter().all(|s| s == "todo"));
    }

    #[tokio::test]
    async fn test_new_columns_only_still_reports_written_records() {
        let (backend, records) = seeded(12).await;
        backend.fail_update_call(2, server_error());

        // Priority is absent on every record, so nothing is captured to restore
        let items: Vec<UpdateItem> = records
            .iter()
            .map(|r| UpdateItem::new(r.id.clone(), fields(&[("Priority", json!("high"))])))
            .collect();
        let err = BulkWriter::new(backend.clone())
            .update_records("Tasks", &items, WriteOptions::default())
            .await
            .unwrap_err();

        err.assert_restored();
        let composite = err.composite_or_panic();
        assert!(composite.rollback_attempted());
        assert_eq!(composite.failed_batch(), 2);

        let message = err.to_string();
        assert!(message.contains("10 previously written records were rolled back"));
        assert!(!message.contains("no records were written"));

        let details = err.details().unwrap();
        assert_eq!(details["rollbackAttempted"], true);
        assert_eq!(details["rollbackSucceeded"], true);
        assert_eq!(details["affectedCount"], 0);

        // No restore writes: only the two forward calls
        assert_eq!(backend.update_calls().len(), 2);
    }
}
