//! Configuration loading and validation tests

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;
    use tablegate::config::{BackendProvider, Config, GatewayConfig};
    use tablegate::utils::error::GatewayError;
    use tempfile::NamedTempFile;

    const MEMORY_CONFIG: &str = r#"
server:
  port: 8100
  timeout: 10
backend:
  provider: memory
  tables: [Tasks, Projects]
auth:
  api_tokens: ["token-abcdefghijklmnop"]
rate_limit:
  bulk_max_requests: 5
audit:
  buffer_size: 64
logging:
  level: debug
  json: true
"#;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_memory_config_round_trips_through_file() {
        let file = write_config(MEMORY_CONFIG);
        let config = Config::from_file(file.path()).await.unwrap();

        assert_eq!(config.server().port, 8100);
        assert_eq!(config.server().timeout, 10);
        assert_eq!(config.server().max_bulk_records, 1000);
        assert_eq!(config.backend().provider, BackendProvider::Memory);
        assert_eq!(config.backend().tables, vec!["Tasks", "Projects"]);
        assert_eq!(config.rate_limit().bulk_max_requests, 5);
        assert_eq!(config.rate_limit().max_requests, 100);
        assert_eq!(config.rate_limit().window_secs, 900);
        assert_eq!(config.audit().buffer_size, 64);
        assert_eq!(config.logging().level, "debug");
        assert!(config.logging().json);

        let yaml = config.to_yaml().unwrap();
        let reparsed = Config::parse(&yaml).unwrap();
        assert_eq!(reparsed.backend.tables, config.backend().tables);
    }

    #[test]
    fn test_http_backend_requires_credentials() {
        let mut gateway = Config::parse(MEMORY_CONFIG).unwrap();
        gateway.backend.provider = BackendProvider::Http;
        let err = Config { gateway }.validate().unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_rejects_bad_api_base() {
        let mut gateway = Config::parse(MEMORY_CONFIG).unwrap();
        gateway.backend.provider = BackendProvider::Http;
        gateway.backend.api_key = "key".to_string();
        gateway.backend.base_id = "appBase".to_string();
        gateway.backend.api_base = "ftp://example.com".to_string();
        assert!(Config { gateway }.validate().is_err());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let vars: HashMap<&str, &str> = [
            ("TABLEGATE_HOST", "127.0.0.1"),
            ("TABLEGATE_MAX_BULK_RECORDS", "50"),
            ("TABLEGATE_AUTH_ENABLED", "false"),
        ]
        .into_iter()
        .collect();

        let mut gateway = Config::parse(MEMORY_CONFIG).unwrap();
        gateway
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(gateway.server.host, "127.0.0.1");
        assert_eq!(gateway.server.port, 8100);
        assert_eq!(gateway.server.max_bulk_records, 50);
        assert!(!gateway.auth.enabled);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let gateway: GatewayConfig = Config::parse("{}").unwrap();
        assert_eq!(gateway.server.port, 8000);
        assert_eq!(gateway.backend.provider, BackendProvider::Http);
        assert!(gateway.auth.enabled);
        assert!(gateway.rate_limit.enabled);
        assert_eq!(gateway.rate_limit.slow_down_after, 50);
        assert_eq!(gateway.rate_limit.slow_down_delay_ms, 500);
        assert_eq!(gateway.rate_limit.slow_down_max_delay_ms, 20_000);
    }
}
