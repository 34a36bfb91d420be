//! tablegate - CRUD gateway for hosted record stores
//!
//! Serves batched bulk writes with compensating rollback over HTTP

#![allow(missing_docs)]

use std::process::ExitCode;
use tablegate::server;

#[tokio::main]
async fn main() -> ExitCode {
    // Logging is initialized from the loaded configuration
    match server::builder::run_server().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Print error using Display (not Debug) to preserve newlines
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
