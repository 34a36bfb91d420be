//! # tablegate
//!
//! A CRUD gateway in front of a hosted tabular record store whose API takes
//! at most ten records per write call and offers no multi-record
//! transaction.
//!
//! ## Features
//!
//! - **Batched bulk writes**: creates and partial updates of any size are
//!   split into sequential ten-record batches
//! - **Compensating rollback**: a failed batch undoes every earlier batch,
//!   deleting created records or restoring captured field values
//! - **Honest failures**: when rollback itself fails, the error names every
//!   record left modified
//! - **Gateway surface**: bearer authentication, rate limiting, audit log
//!
//! ## Library use
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tablegate::{BulkWriter, CreateItem, InMemoryBackend, WriteOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = Arc::new(InMemoryBackend::new());
//!     backend.create_table("Tasks");
//!
//!     let writer = BulkWriter::new(backend);
//!     let items: Vec<CreateItem> = (0..25)
//!         .map(|i| {
//!             let mut fields = serde_json::Map::new();
//!             fields.insert("Name".into(), format!("task {}", i).into());
//!             CreateItem::new(fields)
//!         })
//!         .collect();
//!
//!     let response = writer
//!         .create_records("Tasks", &items, WriteOptions::default())
//!         .await?;
//!     println!("created {} records", response.count);
//!     Ok(())
//! }
//! ```
//!
//! ## Gateway Mode
//!
//! ```rust,no_run
//! use tablegate::{Config, Gateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/tablegate.yaml").await?;
//!     let gateway = Gateway::new(config)?;
//!     gateway.run().await?;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod server;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use utils::error::{GatewayError, Result};

pub use core::backend::{
    BackendError, BackendErrorKind, HttpRecordBackend, InMemoryBackend, RecordBackend,
};
pub use core::batch::{BulkErrorKind, BulkWriteError, BulkWriter, CompositeError, WriteOperation};
pub use core::types::{
    BulkWriteResponse, CreateItem, Fields, ListQuery, Record, RecordPage, UpdateItem, WriteOptions,
};

use tracing::info;

/// A configured gateway ready to serve
pub struct Gateway {
    config: Config,
    server: server::HttpServer,
}

impl Gateway {
    /// Create a new gateway instance
    ///
    /// Must be called inside a Tokio runtime when auditing is enabled.
    pub fn new(config: Config) -> Result<Self> {
        info!("Creating new gateway instance");

        let server = server::HttpServer::new(&config)?;

        Ok(Self { config, server })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the gateway server
    pub async fn run(self) -> Result<()> {
        info!(address = %self.config.server().address(), "Starting tablegate");
        self.server.start().await
    }
}

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Gateway build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Version number
    pub version: &'static str,
    /// Build timestamp
    pub build_time: &'static str,
    /// Git commit hash
    pub git_hash: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: VERSION,
            build_time: option_env!("TABLEGATE_BUILD_TIME").unwrap_or("unknown"),
            git_hash: option_env!("TABLEGATE_GIT_HASH").unwrap_or("unknown"),
        }
    }
}

/// Build
pub fn build_info() -> BuildInfo {
    BuildInfo::default()
}
