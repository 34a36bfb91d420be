//! Error handling utilities
//!
//! Top-level error type, its HTTP rendering and the `Result` alias.

pub mod error;

pub use error::*;
