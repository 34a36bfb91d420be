//! Pre-write snapshots for update rollback
//!
//! Before an update writes anything, every target record is read and the
//! values of the fields about to be overwritten are kept. Only fields the
//! record actually had are kept: writing back a column that was absent (or a
//! column the backend computes) would fail during rollback.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::BulkWriteError;
use crate::core::backend::RecordBackend;
use crate::core::types::{Fields, UpdateItem};

/// Previous values of the fields an update is about to write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: HashMap<String, Fields>,
}

impl Snapshot {
    pub fn get(&self, id: &str) -> Option<&Fields> {
        self.entries.get(id)
    }

    /// Number of records captured
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Restore writes for `ids`, each id once in first-seen order
    ///
    /// Records with nothing to restore are skipped.
    pub fn restore_items<'a>(&self, ids: impl IntoIterator<Item = &'a String>) -> Vec<UpdateItem> {
        let mut seen = HashSet::new();
        ids.into_iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| {
                let fields = self.entries.get(id)?;
                (!fields.is_empty()).then(|| UpdateItem::new(id.clone(), fields.clone()))
            })
            .collect()
    }
}

/// Read every target record and keep the fields about to change
///
/// Reads are sequential, one per distinct id. Any failed read aborts the
/// whole operation before a single write is issued.
pub async fn capture_snapshot(
    backend: &dyn RecordBackend,
    table: &str,
    items: &[UpdateItem],
) -> Result<Snapshot, BulkWriteError> {
    // Union of requested columns per id, in first-seen order
    let mut order: Vec<&str> = Vec::new();
    let mut requested: HashMap<&str, Vec<&str>> = HashMap::new();
    for item in items {
        let columns = requested.entry(item.id.as_str()).or_insert_with(|| {
            order.push(item.id.as_str());
            Vec::new()
        });
        for name in item.fields.keys() {
            if !columns.contains(&name.as_str()) {
                columns.push(name.as_str());
            }
        }
    }

    let mut snapshot = Snapshot::default();
    for id in order {
        let original = backend.get_record(table, id).await.map_err(|source| {
            warn!(table, record_id = id, error = %source, "Snapshot read failed, aborting update");
            BulkWriteError::RollbackUnsupported {
                record_id: id.to_string(),
                source,
            }
        })?;

        let columns = &requested[id];
        let previous: Fields = original
            .fields
            .into_iter()
            .filter(|(name, _)| columns.contains(&name.as_str()))
            .collect();

        snapshot.entries.insert(id.to_string(), previous);
    }

    debug!(table, records = snapshot.len(), "Captured update snapshot");
    Ok(snapshot)
}
