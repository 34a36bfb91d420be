//! Test fixtures and data factories
//!
//! Provides factory methods for creating write items with sensible defaults.

use serde_json::{Value, json};
use tablegate::core::backend::BackendError;
use tablegate::core::types::{CreateItem, Fields, Record, UpdateItem};

/// Fields from `(name, value)` pairs
pub fn fields(pairs: &[(&str, Value)]) -> Fields {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// `count` create items named `task 0`, `task 1`, ...
pub fn create_items(count: usize) -> Vec<CreateItem> {
    (0..count)
        .map(|i| CreateItem::new(fields(&[("Name", json!(format!("task {}", i)))])))
        .collect()
}

/// One update per record, setting `Status`
pub fn status_updates(records: &[Record], status: &str) -> Vec<UpdateItem> {
    records
        .iter()
        .map(|record| UpdateItem::new(record.id.clone(), fields(&[("Status", json!(status))])))
        .collect()
}

pub fn ids(records: &[Record]) -> Vec<String> {
    records.iter().map(|record| record.id.clone()).collect()
}

pub fn invalid_field(table: &str) -> BackendError {
    BackendError::invalid_field_data(table, "Field \"Name\" cannot accept the provided value")
}

pub fn server_error() -> BackendError {
    BackendError::unknown_status(503, "Service unavailable")
}
