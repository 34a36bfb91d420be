//! Route tests through the full middleware stack

#[cfg(test)]
mod tests {
    use crate::common::FlakyBackend;
    use crate::common::fixtures::server_error;
    use actix_web::http::StatusCode;
    use actix_web::{test, web};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tablegate::config::{BackendProvider, Config};
    use tablegate::server::{AppState, HttpServer};
    use tablegate::utils::error::ErrorResponse;

    const TOKEN: &str = "integration-token-0123456789";

    fn config() -> Config {
        let mut config = Config::default();
        config.gateway.backend.provider = BackendProvider::Memory;
        config.gateway.auth.api_tokens = vec![TOKEN.to_string()];
        config.gateway.audit.enabled = false;
        config
    }

    fn bulk_create(body: Value) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/v1/tables/Tasks/records")
            .insert_header(("Authorization", format!("Bearer {}", TOKEN)))
            .set_json(body)
    }

    fn names(count: usize) -> Value {
        let records: Vec<Value> = (0..count)
            .map(|i| json!({"fields": {"Name": format!("row {}", i)}}))
            .collect();
        json!({ "records": records })
    }

    #[actix_web::test]
    async fn test_unrestored_failure_over_http() {
        let backend = Arc::new(FlakyBackend::with_tables(&["Tasks"]));
        backend.fail_create_call(2, server_error());
        backend.fail_deletes(server_error());

        let state = web::Data::new(AppState::with_backend(config(), backend.clone()));
        let app = test::init_service(HttpServer::create_app(state)).await;

        let res = test::call_service(&app, bulk_create(names(12)).to_request()).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: ErrorResponse = test::read_body_json(res).await;
        assert_eq!(body.error.code, "PARTIAL_FAILURE_UNRESTORED");
        assert!(body.error.message.contains("10 records were left modified"));

        let details = body.error.details.unwrap();
        assert_eq!(details["affectedCount"], 10);
        assert_eq!(details["affectedRecordIds"].as_array().unwrap().len(), 10);
        assert_eq!(details["rollbackAttempted"], true);
        assert_eq!(details["rollbackSucceeded"], false);
        assert_eq!(backend.store().record_count("Tasks"), 10);
    }

    #[actix_web::test]
    async fn test_typecast_flag_accepted() {
        let backend = Arc::new(FlakyBackend::with_tables(&["Tasks"]));
        let mut config = config();
        config.gateway.backend.typecast = true;

        let state = web::Data::new(AppState::with_backend(config, backend.clone()));
        let app = test::init_service(HttpServer::create_app(state)).await;

        let mut body = names(2);
        body["typecast"] = json!(false);
        let res = test::call_service(&app, bulk_create(body).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = test::call_service(&app, bulk_create(names(1)).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(backend.store().record_count("Tasks"), 3);
    }

    #[actix_web::test]
    async fn test_bulk_window_limits_only_writes() {
        let backend = Arc::new(FlakyBackend::with_tables(&["Tasks"]));
        let mut config = config();
        config.gateway.rate_limit.bulk_max_requests = 1;

        let state = web::Data::new(AppState::with_backend(config, backend.clone()));
        let app = test::init_service(HttpServer::create_app(state)).await;

        let res = test::call_service(&app, bulk_create(names(1)).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = test::call_service(&app, bulk_create(names(1)).to_request()).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        let body: ErrorResponse = test::read_body_json(res).await;
        assert!(body.error.message.contains("bulk"));

        let req = test::TestRequest::get()
            .uri("/v1/tables/Tasks/records")
            .insert_header(("Authorization", format!("Bearer {}", TOKEN)))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(backend.store().record_count("Tasks"), 1);
    }

    #[actix_web::test]
    async fn test_auth_disabled_opens_routes() {
        let backend = Arc::new(FlakyBackend::with_tables(&["Tasks"]));
        let mut config = config();
        config.gateway.auth.enabled = false;

        let state = web::Data::new(AppState::with_backend(config, backend));
        let app = test::init_service(HttpServer::create_app(state)).await;

        let req = test::TestRequest::get()
            .uri("/v1/tables/Tasks/records")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
