//! Batch splitting
//!
//! Splits an ordered request into contiguous groups no larger than the
//! backend's per-call limit. Order is preserved and nothing is dropped; only
//! the last batch may be short.

use super::BulkWriteError;
use crate::core::backend::MAX_RECORDS_PER_CALL;

/// Records per backend call; fixed by the backend, not configurable
pub const MAX_BATCH_SIZE: usize = MAX_RECORDS_PER_CALL;

/// Split `items` into `ceil(len / batch_size)` order-preserving batches
pub fn split_batches<T>(items: &[T], batch_size: usize) -> Result<Vec<&[T]>, BulkWriteError> {
    if batch_size == 0 {
        return Err(BulkWriteError::InvalidBatchSize(batch_size));
    }
    Ok(items.chunks(batch_size).collect())
}

/// Number of batches `len` items split into
pub fn batch_count(len: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    len.div_ceil(batch_size)
}
