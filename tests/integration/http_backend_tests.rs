//! Bulk writes over the HTTP gateway against a mock record store

#[cfg(test)]
mod tests {
    use crate::common::fixtures::create_items;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tablegate::config::{BackendConfig, BackendProvider};
    use tablegate::core::backend::HttpRecordBackend;
    use tablegate::core::batch::{BulkErrorKind, BulkWriter};
    use tablegate::core::types::WriteOptions;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn writer_for(server: &MockServer) -> BulkWriter {
        let config = BackendConfig {
            provider: BackendProvider::Http,
            api_base: server.uri(),
            api_key: "key123".to_string(),
            base_id: "appBase".to_string(),
            ..BackendConfig::default()
        };
        BulkWriter::new(Arc::new(HttpRecordBackend::new(&config).unwrap()))
    }

    fn created(start: usize, count: usize) -> Value {
        let records: Vec<Value> = (start..start + count)
            .map(|i| {
                json!({
                    "id": format!("rec{:03}", i),
                    "fields": {"Name": format!("task {}", i)},
                    "createdTime": "2024-05-01T00:00:00.000Z"
                })
            })
            .collect();
        json!({ "records": records })
    }

    #[tokio::test]
    async fn test_rollback_deletes_over_http() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v0/appBase/Tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(created(0, 10)))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v0/appBase/Tasks"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "error": {"type": "INVALID_VALUE_FOR_COLUMN", "message": "Field \"Name\" cannot accept the provided value"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let deleted: Vec<Value> = (0..10)
            .map(|i| json!({"id": format!("rec{:03}", i), "deleted": true}))
            .collect();
        Mock::given(method("DELETE"))
            .and(path("/v0/appBase/Tasks"))
            .and(query_param("records[]", "rec000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": deleted })))
            .expect(1)
            .mount(&server)
            .await;

        let err = writer_for(&server)
            .create_records("Tasks", &create_items(25), WriteOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), BulkErrorKind::PartialFailureRestored);
        assert_eq!(err.code(), "INVALID_FIELD_DATA");
        assert_eq!(err.http_status(), 422);
        let composite = err.composite().unwrap();
        assert_eq!(composite.failed_batch(), 2);
        assert!(composite.rollback_attempted());
    }

    #[tokio::test]
    async fn test_rollback_failure_over_http() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(created(0, 10)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&server)
            .await;

        let err = writer_for(&server)
            .create_records("Tasks", &create_items(12), WriteOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), BulkErrorKind::PartialFailureUnrestored);
        let composite = err.composite().unwrap();
        assert_eq!(composite.affected_count(), 10);
        assert_eq!(composite.affected_ids()[0], "rec000");
        assert_eq!(composite.affected_ids()[9], "rec009");
    }

    #[tokio::test]
    async fn test_all_batches_commit_over_http() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(created(0, 10)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(created(10, 3)))
            .expect(1)
            .mount(&server)
            .await;

        let response = writer_for(&server)
            .create_records("Tasks", &create_items(13), WriteOptions::default())
            .await
            .unwrap();

        assert_eq!(response.count, 13);
        assert_eq!(response.records[12].id, "rec012");
    }
}
