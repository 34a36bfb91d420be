//! Logging utilities
//!
//! Tracing subscriber setup and the asynchronous audit log.

pub mod logging;

pub use logging::*;
