//! Common test utilities for tablegate
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::common::{FlakyBackend, fixtures};
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let backend = FlakyBackend::with_tables(&["Tasks"]);
//!     backend.fail_create_call(2, fixtures::invalid_field("Tasks"));
//!     // ...
//! }
//! ```

pub mod assertions;
pub mod fixtures;

pub use backend::{BackendCall, FlakyBackend};
