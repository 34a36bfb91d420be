//! Bulk create integration tests
//!
//! Batching and delete-based rollback against the failure-injecting backend.

#[cfg(test)]
mod tests {
    use crate::common::assertions::BulkWriteErrorAssertions;
    use crate::common::fixtures::{create_items, invalid_field, server_error};
    use crate::common::{BackendCall, FlakyBackend};
    use std::sync::Arc;
    use tablegate::core::batch::{BulkErrorKind, BulkWriter, WriteOperation};
    use tablegate::core::types::WriteOptions;

    fn writer(backend: &Arc<FlakyBackend>) -> BulkWriter {
        BulkWriter::new(backend.clone())
    }

    #[tokio::test]
    async fn test_twenty_five_records_three_batches() {
        let backend = Arc::new(FlakyBackend::with_tables(&["Tasks"]));

        let response = writer(&backend)
            .create_records("Tasks", &create_items(25), WriteOptions::default())
            .await
            .unwrap();

        assert_eq!(response.count, 25);
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::Create(10),
                BackendCall::Create(10),
                BackendCall::Create(5)
            ]
        );

        let names: Vec<_> = response
            .records
            .iter()
            .map(|r| r.fields["Name"].as_str().unwrap().to_string())
            .collect();
        let expected: Vec<_> = (0..25).map(|i| format!("task {}", i)).collect();
        assert_eq!(names, expected);
        assert_eq!(backend.store().record_count("Tasks"), 25);
    }

    #[tokio::test]
    async fn test_exact_multiple_of_batch_size() {
        let backend = Arc::new(FlakyBackend::with_tables(&["Tasks"]));

        writer(&backend)
            .create_records("Tasks", &create_items(20), WriteOptions::default())
            .await
            .unwrap();

        assert_eq!(
            backend.calls(),
            vec![BackendCall::Create(10), BackendCall::Create(10)]
        );
    }

    #[tokio::test]
    async fn test_second_batch_failure_deletes_first_batch() {
        let backend = Arc::new(FlakyBackend::with_tables(&["Tasks"]));
        backend.fail_create_call(2, invalid_field("Tasks"));

        let err = writer(&backend)
            .create_records("Tasks", &create_items(25), WriteOptions::default())
            .await
            .unwrap_err();

        err.assert_restored();
        let composite = err.composite_or_panic();
        assert_eq!(composite.operation(), WriteOperation::Create);
        assert_eq!(composite.failed_batch(), 2);
        assert_eq!(composite.total_batches(), 3);
        assert!(composite.rollback_attempted());
        assert_eq!(err.code(), "INVALID_FIELD_DATA");
        assert_eq!(err.http_status(), 422);

        // Batch 3 is never sent; the ten created ids are deleted in one call
        let deletes = backend.delete_calls();
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0].len(), 10);
        assert!(!backend.calls().contains(&BackendCall::Create(5)));
        assert_eq!(backend.store().record_count("Tasks"), 0);
    }

    #[tokio::test]
    async fn test_third_batch_failure_deletes_in_commit_order() {
        let backend = Arc::new(FlakyBackend::with_tables(&["Tasks"]));
        backend.fail_create_call(3, server_error());

        let err = writer(&backend)
            .create_records("Tasks", &create_items(30), WriteOptions::default())
            .await
            .unwrap_err();

        err.assert_restored();
        assert_eq!(err.code(), "BACKEND_ERROR");

        let deletes = backend.delete_calls();
        assert_eq!(deletes.len(), 2);
        assert_eq!(deletes[0].len(), 10);
        assert_eq!(deletes[1].len(), 10);
        assert_eq!(backend.store().record_count("Tasks"), 0);
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_affected_records() {
        let backend = Arc::new(FlakyBackend::with_tables(&["Tasks"]));
        backend.fail_create_call(2, server_error());
        backend.fail_deletes(server_error());

        let err = writer(&backend)
            .create_records("Tasks", &create_items(12), WriteOptions::default())
            .await
            .unwrap_err();

        err.assert_unrestored(10);
        assert_eq!(err.code(), "PARTIAL_FAILURE_UNRESTORED");
        assert_eq!(err.http_status(), 500);
        assert!(err.to_string().contains("10"));

        let stored: Vec<String> = backend
            .store()
            .records("Tasks")
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(err.composite_or_panic().affected_ids(), stored.as_slice());
    }

    #[tokio::test]
    async fn test_first_batch_failure_writes_nothing() {
        let backend = Arc::new(FlakyBackend::with_tables(&["Tasks"]));
        backend.fail_create_call(1, invalid_field("Tasks"));

        let err = writer(&backend)
            .create_records("Tasks", &create_items(15), WriteOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), BulkErrorKind::PartialFailureRestored);
        let composite = err.composite_or_panic();
        assert!(!composite.rollback_attempted());
        assert_eq!(composite.failed_batch(), 1);
        assert!(backend.delete_calls().is_empty());
        assert_eq!(backend.calls(), vec![BackendCall::Create(10)]);
    }

    #[tokio::test]
    async fn test_unknown_table_reported_as_is() {
        let backend = Arc::new(FlakyBackend::with_tables(&["Tasks"]));

        let err = writer(&backend)
            .create_records("Missing", &create_items(3), WriteOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "TABLE_NOT_FOUND");
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn test_empty_request_makes_no_calls() {
        let backend = Arc::new(FlakyBackend::with_tables(&["Tasks"]));

        let response = writer(&backend)
            .create_records("Tasks", &[], WriteOptions::default())
            .await
            .unwrap();

        assert_eq!(response.count, 0);
        assert!(backend.calls().is_empty());
    }
}
