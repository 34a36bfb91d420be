//! Custom test assertions
//!
//! Provides domain-specific assertions on bulk write failures.

use tablegate::core::batch::{BulkErrorKind, BulkWriteError, CompositeError};

/// Assertions for BulkWriteError
pub trait BulkWriteErrorAssertions {
    /// Assert the failure carries a rollback outcome and return it
    fn composite_or_panic(&self) -> &CompositeError;

    /// Assert a mid-operation failure left nothing modified
    fn assert_restored(&self);

    /// Assert rollback failed with exactly `affected` records left modified
    fn assert_unrestored(&self, affected: usize);
}

impl BulkWriteErrorAssertions for BulkWriteError {
    fn composite_or_panic(&self) -> &CompositeError {
        match self.composite() {
            Some(composite) => composite,
            None => panic!("Expected a partial failure, got {:?}", self),
        }
    }

    fn assert_restored(&self) {
        assert_eq!(
            self.kind(),
            BulkErrorKind::PartialFailureRestored,
            "Expected a restored failure, got {:?}",
            self
        );
        let composite = self.composite_or_panic();
        assert!(composite.rollback_succeeded());
        assert_eq!(composite.affected_count(), 0);
        assert!(composite.affected_ids().is_empty());
    }

    fn assert_unrestored(&self, affected: usize) {
        assert_eq!(
            self.kind(),
            BulkErrorKind::PartialFailureUnrestored,
            "Expected an unrestored failure, got {:?}",
            self
        );
        let composite = self.composite_or_panic();
        assert!(composite.rollback_attempted());
        assert!(!composite.rollback_succeeded());
        assert!(composite.rollback_error().is_some());
        assert_eq!(composite.affected_count(), affected);
        assert_eq!(composite.affected_ids().len(), affected);
    }
}
