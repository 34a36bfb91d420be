//! Record CRUD endpoints
//!
//! Single-record reads and deletes go straight to the backend. Bulk creates
//! and updates are validated here and handed to the [`BulkWriter`] on their
//! own task, so a caller that gives up does not cut a write or its rollback
//! short.
//!
//! [`BulkWriter`]: crate::core::batch::BulkWriter

use crate::core::batch::BulkWriteError;
use crate::core::types::{
    BulkWriteResponse, CreateItem, Fields, ListQuery, UpdateItem, WriteOptions,
};
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Configure record routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1/tables/{table}/records")
            .route("", web::get().to(list_records))
            .route("", web::post().to(create_records))
            .route("", web::patch().to(update_records))
            .route("/{id}", web::get().to(get_record))
            .route("/{id}", web::delete().to(delete_record)),
    );
}

/// Body of a bulk create or update
///
/// Records stay untyped until [`parse_create_items`] or
/// [`parse_update_items`] checks them, so violations can name the offending
/// index.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkWriteRequest {
    pub records: Vec<Value>,
    #[serde(default)]
    pub typecast: Option<bool>,
}

/// List one page of records
async fn list_records(
    state: web::Data<AppState>,
    table: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let table = table.into_inner();
    let query = parse_list_query(req.query_string())?;
    debug!(table = %table, ?query, "Listing records");

    let page = state.backend.list_records(&table, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Fetch one record
async fn get_record(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (table, id) = path.into_inner();
    debug!(table = %table, id = %id, "Fetching record");

    let record = state.backend.get_record(&table, &id).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Delete one record
async fn delete_record(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (table, id) = path.into_inner();
    debug!(table = %table, id = %id, "Deleting record");

    state.backend.delete_record(&table, &id).await?;
    Ok(HttpResponse::Ok().json(json!({ "id": id, "deleted": true })))
}

/// Bulk create
async fn create_records(
    state: web::Data<AppState>,
    table: web::Path<String>,
    body: web::Json<BulkWriteRequest>,
) -> Result<HttpResponse> {
    let table = table.into_inner();
    let body = body.into_inner();
    check_record_count(body.records.len(), state.config.server().max_bulk_records)?;

    let options = write_options(&state, body.typecast);
    let items = parse_create_items(body.records)?;
    debug!(table = %table, records = items.len(), "Bulk create requested");

    let writer = state.writer.clone();
    let task_table = table.clone();
    let task = tokio::spawn(async move {
        writer.create_records(&task_table, &items, options).await
    });

    let response = await_bulk(task, request_timeout(&state), &table).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Bulk partial update
async fn update_records(
    state: web::Data<AppState>,
    table: web::Path<String>,
    body: web::Json<BulkWriteRequest>,
) -> Result<HttpResponse> {
    let table = table.into_inner();
    let body = body.into_inner();
    check_record_count(body.records.len(), state.config.server().max_bulk_records)?;

    let options = write_options(&state, body.typecast);
    let items = parse_update_items(body.records)?;
    debug!(table = %table, records = items.len(), "Bulk update requested");

    let writer = state.writer.clone();
    let task_table = table.clone();
    let task = tokio::spawn(async move {
        writer.update_records(&task_table, &items, options).await
    });

    let response = await_bulk(task, request_timeout(&state), &table).await?;
    Ok(HttpResponse::Ok().json(response))
}

fn write_options(state: &AppState, typecast: Option<bool>) -> WriteOptions {
    WriteOptions {
        typecast: typecast.unwrap_or(state.config.backend().typecast),
    }
}

fn request_timeout(state: &AppState) -> Duration {
    Duration::from_secs(state.config.server().timeout)
}

/// Wait for a spawned bulk write, giving up after `timeout`
///
/// The task is detached on timeout, never aborted: it still finishes its
/// batches or its rollback pass.
async fn await_bulk(
    task: JoinHandle<std::result::Result<BulkWriteResponse, BulkWriteError>>,
    timeout: Duration,
    table: &str,
) -> Result<BulkWriteResponse> {
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => Ok(result?),
        Ok(Err(join_error)) => Err(GatewayError::internal(format!(
            "Bulk write task failed: {}",
            join_error
        ))),
        Err(_) => {
            warn!(
                table,
                timeout_secs = timeout.as_secs_f64(),
                "Bulk write still running after request timeout"
            );
            Err(GatewayError::timeout(format!(
                "Bulk write on table '{}' did not finish in time; it will complete or roll back in the background",
                table
            )))
        }
    }
}

pub(crate) fn check_record_count(len: usize, max: usize) -> Result<()> {
    if len == 0 {
        return Err(GatewayError::validation("records must not be empty"));
    }
    if len > max {
        return Err(GatewayError::validation(format!(
            "Too many records: {} (maximum {})",
            len, max
        )));
    }
    Ok(())
}

fn take_fields(record: &mut Fields, index: usize) -> Result<Fields> {
    match record.remove("fields") {
        Some(Value::Object(fields)) => Ok(fields),
        _ => Err(GatewayError::validation(format!(
            "records[{}].fields must be an object",
            index
        ))),
    }
}

/// Check the shape of each create record
pub fn parse_create_items(records: Vec<Value>) -> Result<Vec<CreateItem>> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| match record {
            Value::Object(mut record) => Ok(CreateItem::new(take_fields(&mut record, index)?)),
            _ => Err(GatewayError::validation(format!(
                "records[{}] must be an object",
                index
            ))),
        })
        .collect()
}

/// Check the shape of each update record
pub fn parse_update_items(records: Vec<Value>) -> Result<Vec<UpdateItem>> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let Value::Object(mut record) = record else {
                return Err(GatewayError::validation(format!(
                    "records[{}] must be an object",
                    index
                )));
            };
            let id = match record.remove("id") {
                Some(Value::String(id)) if !id.trim().is_empty() => id,
                _ => {
                    return Err(GatewayError::validation(format!(
                        "records[{}].id must be a non-empty string",
                        index
                    )));
                }
            };
            Ok(UpdateItem::new(id, take_fields(&mut record, index)?))
        })
        .collect()
}

/// Parse list parameters, accepting both `fields[]=` and `fields=`
pub fn parse_list_query(query_string: &str) -> Result<ListQuery> {
    let mut query = ListQuery::default();

    for (key, value) in url::form_urlencoded::parse(query_string.as_bytes()) {
        match key.as_ref() {
            "pageSize" => {
                let size = value.parse::<u32>().map_err(|_| {
                    GatewayError::validation(format!("pageSize must be an integer, got '{}'", value))
                })?;
                query.page_size = Some(size);
            }
            "offset" => query.offset = Some(value.into_owned()),
            "view" => query.view = Some(value.into_owned()),
            "filterByFormula" => query.filter_by_formula = Some(value.into_owned()),
            "fields[]" | "fields" => query.fields.push(value.into_owned()),
            _ => {}
        }
    }

    query.validate().map_err(GatewayError::validation)?;
    Ok(query)
}
