//! Integration tests for tablegate
//!
//! These tests drive the bulk writer, the HTTP gateway and the route surface
//! together against in-memory or mock backends.

pub mod bulk_create_tests;
pub mod bulk_update_tests;
pub mod config_validation_tests;
pub mod http_backend_tests;
pub mod routes_tests;
