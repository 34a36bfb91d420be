//! Batched bulk writes with compensating rollback
//!
//! The backend accepts at most ten records per call and has no multi-record
//! transaction. A bulk request is therefore split into batches that are
//! written one after another; if a batch fails, everything the earlier
//! batches wrote is undone by compensating calls (deletes for creates,
//! snapshot restores for updates) and the outcome of that rollback is folded
//! into the returned error.

mod error;
mod orchestrator;
mod rollback;
mod snapshot;
mod splitter;


pub use error::{BulkErrorKind, BulkWriteError, CompositeError, RollbackOutcome, WriteOperation};
pub use orchestrator::BulkWriter;
pub use rollback::RollbackController;
pub use snapshot::{Snapshot, capture_snapshot};
pub use splitter::{MAX_BATCH_SIZE, batch_count, split_batches};
