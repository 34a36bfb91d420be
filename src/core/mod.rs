//! Core functionality for the gateway
//!
//! This module contains the record store gateway and the bulk write engine.

pub mod backend;
pub mod batch;
pub mod types;
