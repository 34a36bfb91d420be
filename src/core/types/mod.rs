//! Core type definition module
//!
//! Contains the record and request types shared by the backend gateway, the
//! bulk writer and the HTTP layer.

pub mod record;

pub use record::*;
