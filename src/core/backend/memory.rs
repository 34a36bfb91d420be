//! In-process record backend
//!
//! Mirrors the hosted store's observable behavior closely enough to develop
//! and test against: tables must exist, each call is applied atomically,
//! computed columns reject writes, writing `null` clears a column, and calls
//! larger than the per-call limit are refused.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use super::{BackendError, RecordBackend, check_batch_size};
use crate::core::types::{
    CreateItem, Fields, ListQuery, Record, RecordPage, UpdateItem, WriteOptions,
};

const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Default)]
struct Table {
    /// Records in creation order
    records: Vec<Record>,
    /// Columns the backend computes; writes to them are rejected
    computed: HashSet<String>,
}

impl Table {
    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    fn check_writable(&self, table: &str, fields: &Fields) -> Result<(), BackendError> {
        for name in fields.keys() {
            if name.is_empty() {
                return Err(BackendError::invalid_field_data(table, "Field names cannot be empty"));
            }
            if self.computed.contains(name) {
                return Err(BackendError::invalid_field_data(
                    table,
                    format!("Field \"{}\" cannot accept a value because the field is computed", name),
                ));
            }
        }
        Ok(())
    }
}

/// Apply a partial write: `null` clears, anything else overwrites
fn merge_fields(target: &mut Fields, changes: &Fields) {
    for (name, value) in changes {
        if value.is_null() {
            target.remove(name);
        } else {
            target.insert(name.clone(), value.clone());
        }
    }
}

fn new_record_id() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("rec{}", &raw[..14])
}

/// Tables held in process memory
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: RwLock<HashMap<String, Table>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table; no-op if it already exists
    pub fn create_table(&self, name: &str) {
        self.tables.write().entry(name.to_string()).or_default();
    }

    /// Create a table whose listed columns are computed by the backend
    pub fn create_table_with_computed(&self, name: &str, computed: &[&str]) {
        let mut tables = self.tables.write();
        let table = tables.entry(name.to_string()).or_default();
        table.computed = computed.iter().map(|c| c.to_string()).collect();
    }

    /// Set a column value directly, bypassing write checks (seeds computed columns)
    pub fn set_field(&self, table: &str, id: &str, name: &str, value: Value) -> bool {
        let mut tables = self.tables.write();
        let Some(record) = tables
            .get_mut(table)
            .and_then(|t| t.records.iter_mut().find(|r| r.id == id))
        else {
            return false;
        };
        record.fields.insert(name.to_string(), value);
        true
    }

    /// Snapshot of a table's records in creation order
    pub fn records(&self, table: &str) -> Vec<Record> {
        self.tables
            .read()
            .get(table)
            .map(|t| t.records.clone())
            .unwrap_or_default()
    }

    pub fn record_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, |t| t.records.len())
    }
}

#[async_trait]
impl RecordBackend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_records(
        &self,
        table: &str,
        query: &ListQuery,
    ) -> Result<RecordPage, BackendError> {
        let tables = self.tables.read();
        let stored = tables
            .get(table)
            .ok_or_else(|| BackendError::table_not_found(table, "Table does not exist"))?;

        let start = match &query.offset {
            Some(offset) => offset.parse::<usize>().map_err(|_| {
                BackendError::invalid_field_data(table, format!("Invalid offset: {}", offset))
            })?,
            None => 0,
        };
        let size = query.page_size.map_or(DEFAULT_PAGE_SIZE, |s| s as usize);

        let records: Vec<Record> = stored
            .records
            .iter()
            .skip(start)
            .take(size)
            .map(|record| {
                if query.fields.is_empty() {
                    return record.clone();
                }
                let mut projected = record.clone();
                projected.fields.retain(|name, _| query.fields.contains(name));
                projected
            })
            .collect();

        let next = start + records.len();
        let offset = (next < stored.records.len()).then(|| next.to_string());

        Ok(RecordPage { records, offset })
    }

    async fn get_record(&self, table: &str, id: &str) -> Result<Record, BackendError> {
        let tables = self.tables.read();
        let stored = tables
            .get(table)
            .ok_or_else(|| BackendError::table_not_found(table, "Table does not exist"))?;

        stored
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| BackendError::record_not_found(table, format!("Record {} not found", id)))
    }

    async fn create_records(
        &self,
        table: &str,
        items: &[CreateItem],
        _options: WriteOptions,
    ) -> Result<Vec<Record>, BackendError> {
        check_batch_size(items.len())?;

        let mut tables = self.tables.write();
        let stored = tables
            .get_mut(table)
            .ok_or_else(|| BackendError::table_not_found(table, "Table does not exist"))?;

        for item in items {
            stored.check_writable(table, &item.fields)?;
        }

        let created: Vec<Record> = items
            .iter()
            .map(|item| {
                let mut fields = Fields::new();
                merge_fields(&mut fields, &item.fields);
                Record {
                    id: new_record_id(),
                    fields,
                    created_time: Utc::now(),
                }
            })
            .collect();

        stored.records.extend(created.iter().cloned());
        Ok(created)
    }

    async fn update_records(
        &self,
        table: &str,
        items: &[UpdateItem],
        _options: WriteOptions,
    ) -> Result<Vec<Record>, BackendError> {
        check_batch_size(items.len())?;

        let mut tables = self.tables.write();
        let stored = tables
            .get_mut(table)
            .ok_or_else(|| BackendError::table_not_found(table, "Table does not exist"))?;

        // Validate the whole call before touching anything
        let mut positions = Vec::with_capacity(items.len());
        for item in items {
            let position = stored.position(&item.id).ok_or_else(|| {
                BackendError::record_not_found(table, format!("Record {} not found", item.id))
            })?;
            stored.check_writable(table, &item.fields)?;
            positions.push(position);
        }

        let mut updated = Vec::with_capacity(items.len());
        for (item, position) in items.iter().zip(positions) {
            let record = &mut stored.records[position];
            merge_fields(&mut record.fields, &item.fields);
            updated.push(record.clone());
        }
        Ok(updated)
    }

    async fn delete_records(&self, table: &str, ids: &[String]) -> Result<Vec<String>, BackendError> {
        check_batch_size(ids.len())?;

        let mut tables = self.tables.write();
        let stored = tables
            .get_mut(table)
            .ok_or_else(|| BackendError::table_not_found(table, "Table does not exist"))?;

        if let Some(missing) = ids.iter().find(|id| stored.position(id).is_none()) {
            return Err(BackendError::record_not_found(
                table,
                format!("Record {} not found", missing),
            ));
        }

        stored.records.retain(|r| !ids.contains(&r.id));
        Ok(ids.to_vec())
    }
}
