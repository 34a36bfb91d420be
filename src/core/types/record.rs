//! Record types exchanged with the backend
//!
//! Field names are backend-defined columns and are not known at compile time,
//! so fields are modelled as an open JSON object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open field mapping: column name to backend-typed value
pub type Fields = Map<String, Value>;

/// A record as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Backend-assigned identifier
    pub id: String,
    /// Field values; columns the backend considers empty are omitted
    #[serde(default)]
    pub fields: Fields,
    /// Creation timestamp
    #[serde(rename = "createdTime")]
    pub created_time: DateTime<Utc>,
}

/// A record to create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateItem {
    pub fields: Fields,
}

impl CreateItem {
    pub fn new(fields: Fields) -> Self {
        Self { fields }
    }
}

/// A partial update of an existing record
///
/// Only the listed fields are written; the rest of the record is untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateItem {
    pub id: String,
    pub fields: Fields,
}

impl UpdateItem {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Result of a committed bulk write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkWriteResponse {
    /// Records in input order, batch by batch
    pub records: Vec<Record>,
    pub count: usize,
}

impl BulkWriteResponse {
    pub fn new(records: Vec<Record>) -> Self {
        let count = records.len();
        Self { records, count }
    }
}

/// Options forwarded to the backend on write calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Let the backend coerce string values into the column type
    pub typecast: bool,
}

/// Parameters of a list call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Continuation cursor returned by the previous page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_by_formula: Option<String>,
    /// Restrict returned columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

/// Largest page the backend serves
pub const MAX_PAGE_SIZE: u32 = 100;

impl ListQuery {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(size) = self.page_size {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(format!("pageSize must be between 1 and {}", MAX_PAGE_SIZE));
            }
        }
        Ok(())
    }
}

/// One page of a list call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPage {
    pub records: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}
