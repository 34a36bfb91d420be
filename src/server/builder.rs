//! Command line entry point
//!
//! Loads `.env`, reads the YAML configuration (falling back to environment
//! variables alone when the file is missing), initializes logging and runs
//! the server.

use crate::config::Config;
use crate::server::server::HttpServer;
use crate::utils::error::Result;
use crate::utils::logging::init_logging;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

/// Command line arguments
#[derive(Debug, Clone, Parser)]
#[command(name = "tablegate", version, about)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "TABLEGATE_CONFIG", default_value = "config/tablegate.yaml")]
    pub config: PathBuf,

    /// Override the listen host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Args {
    /// Apply command line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.gateway.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.gateway.server.port = port;
        }
    }
}

/// Load configuration for `args`
///
/// A missing file is not an error; any other read or parse failure is.
pub async fn load_config(args: &Args) -> Result<Config> {
    let mut config = if args.config.exists() {
        Config::from_file(&args.config).await?
    } else {
        Config::from_env()?
    };
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Run the server with automatic configuration loading
pub async fn run_server() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = load_config(&args).await?;
    init_logging(config.logging());

    if !args.config.exists() {
        warn!(path = %args.config.display(), "Configuration file not found, using environment only");
    }
    info!(
        version = crate::VERSION,
        backend = ?config.backend().provider,
        "Starting tablegate"
    );

    let server = HttpServer::new(&config)?;
    info!("Server starting at: http://{}", config.server().address());
    info!("API Endpoints:");
    info!("   GET    /health");
    info!("   GET    /v1/tables/{{table}}/records");
    info!("   POST   /v1/tables/{{table}}/records");
    info!("   PATCH  /v1/tables/{{table}}/records");
    info!("   GET    /v1/tables/{{table}}/records/{{id}}");
    info!("   DELETE /v1/tables/{{table}}/records/{{id}}");

    server.start().await
}
