//! HTTPS record store client
//!
//! One reqwest client per process, built once from configuration. Requests
//! follow the hosted store's REST layout:
//!
//! ```text
//! GET    {api_base}/v0/{base_id}/{table}?pageSize=&offset=&view=&filterByFormula=&fields[]=
//! GET    {api_base}/v0/{base_id}/{table}/{id}
//! POST   {api_base}/v0/{base_id}/{table}        {"records": [{"fields": ..}]}
//! PATCH  {api_base}/v0/{base_id}/{table}        {"records": [{"id": .., "fields": ..}]}
//! DELETE {api_base}/v0/{base_id}/{table}?records[]=..
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use super::{BackendError, BackendErrorMapper, RecordBackend, check_batch_size};
use crate::config::BackendConfig;
use crate::core::types::{CreateItem, ListQuery, Record, RecordPage, UpdateItem, WriteOptions};
use crate::utils::error::{GatewayError, Result};

/// Connection settings for the shared client
struct PoolConfig;
impl PoolConfig {
    const POOL_SIZE: usize = 16;
    const KEEPALIVE_SECS: u64 = 90;
    const CONNECT_TIMEOUT_SECS: u64 = 10;
}

#[derive(Deserialize)]
struct RecordsEnvelope {
    records: Vec<Record>,
}

#[derive(Deserialize)]
struct DeletedRecord {
    id: String,
    #[serde(default)]
    deleted: bool,
}

#[derive(Deserialize)]
struct DeletedEnvelope {
    records: Vec<DeletedRecord>,
}

/// Record backend speaking the hosted store's REST API
#[derive(Debug, Clone)]
pub struct HttpRecordBackend {
    client: Client,
    api_base: Url,
    api_key: String,
    base_id: String,
    error_mapper: BackendErrorMapper,
}

impl HttpRecordBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let api_base = Url::parse(&config.api_base)
            .map_err(|e| GatewayError::Config(format!("Invalid backend api_base: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .connect_timeout(Duration::from_secs(PoolConfig::CONNECT_TIMEOUT_SECS))
            .pool_idle_timeout(Duration::from_secs(PoolConfig::KEEPALIVE_SECS))
            .pool_max_idle_per_host(PoolConfig::POOL_SIZE)
            .user_agent(concat!("tablegate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base,
            api_key: config.api_key.clone(),
            base_id: config.base_id.clone(),
            error_mapper: BackendErrorMapper,
        })
    }

    fn table_url(&self, table: &str) -> std::result::Result<Url, BackendError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::unknown("Backend api_base cannot carry a path"))?
            .pop_if_empty()
            .extend(["v0", self.base_id.as_str(), table]);
        Ok(url)
    }

    fn record_url(&self, table: &str, id: &str) -> std::result::Result<Url, BackendError> {
        let mut url = self.table_url(table)?;
        url.path_segments_mut()
            .map_err(|_| BackendError::unknown("Backend api_base cannot carry a path"))?
            .push(id);
        Ok(url)
    }

    /// Send a request and decode a successful JSON body; failures are classified
    async fn send<T: DeserializeOwned>(
        &self,
        table: &str,
        request: RequestBuilder,
    ) -> std::result::Result<T, BackendError> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| self.error_mapper.map_transport_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.error_mapper.map_transport_error(&e))?;

        if !status.is_success() {
            return Err(self.error_mapper.map_http_error(table, status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            BackendError::unknown(format!("Failed to decode backend response: {}", e))
        })
    }

    fn write_body<T: serde::Serialize>(items: &[T], options: WriteOptions) -> Value {
        let mut body = json!({ "records": items });
        if options.typecast {
            body["typecast"] = Value::Bool(true);
        }
        body
    }
}

#[async_trait]
impl RecordBackend for HttpRecordBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn list_records(
        &self,
        table: &str,
        query: &ListQuery,
    ) -> std::result::Result<RecordPage, BackendError> {
        let mut url = self.table_url(table)?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(page_size) = query.page_size {
                pairs.append_pair("pageSize", &page_size.to_string());
            }
            if let Some(offset) = &query.offset {
                pairs.append_pair("offset", offset);
            }
            if let Some(view) = &query.view {
                pairs.append_pair("view", view);
            }
            if let Some(formula) = &query.filter_by_formula {
                pairs.append_pair("filterByFormula", formula);
            }
            for field in &query.fields {
                pairs.append_pair("fields[]", field);
            }
        }

        debug!(table, "Listing records");
        self.send(table, self.client.get(url)).await
    }

    async fn get_record(&self, table: &str, id: &str) -> std::result::Result<Record, BackendError> {
        let url = self.record_url(table, id)?;
        debug!(table, id, "Fetching record");
        self.send(table, self.client.get(url)).await
    }

    async fn create_records(
        &self,
        table: &str,
        items: &[CreateItem],
        options: WriteOptions,
    ) -> std::result::Result<Vec<Record>, BackendError> {
        check_batch_size(items.len())?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.table_url(table)?;
        debug!(table, count = items.len(), "Creating record batch");
        let envelope: RecordsEnvelope = self
            .send(
                table,
                self.client.post(url).json(&Self::write_body(items, options)),
            )
            .await?;
        Ok(envelope.records)
    }

    async fn update_records(
        &self,
        table: &str,
        items: &[UpdateItem],
        options: WriteOptions,
    ) -> std::result::Result<Vec<Record>, BackendError> {
        check_batch_size(items.len())?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.table_url(table)?;
        debug!(table, count = items.len(), "Updating record batch");
        let envelope: RecordsEnvelope = self
            .send(
                table,
                self.client.patch(url).json(&Self::write_body(items, options)),
            )
            .await?;
        Ok(envelope.records)
    }

    async fn delete_records(
        &self,
        table: &str,
        ids: &[String],
    ) -> std::result::Result<Vec<String>, BackendError> {
        check_batch_size(ids.len())?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut url = self.table_url(table)?;
        {
            let mut pairs = url.query_pairs_mut();
            for id in ids {
                pairs.append_pair("records[]", id);
            }
        }

        debug!(table, count = ids.len(), "Deleting record batch");
        let envelope: DeletedEnvelope = self.send(table, self.client.delete(url)).await?;
        Ok(envelope
            .records
            .into_iter()
            .filter(|r| r.deleted)
            .map(|r| r.id)
            .collect())
    }
}
