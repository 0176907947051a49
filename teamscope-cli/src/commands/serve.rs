//! Teamscope serve command for running the dashboard server
//!
//! Serves the REST API and the SSE event stream over one listener.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use teamscope_server::{DEFAULT_PORT, ServerConfig, TeamscopeServer};
use tracing::info;

/// Default host for the teamscope server
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Directory holding the event database and notification queue
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let data_dir = args.data_dir.unwrap_or_else(teamscope_paths::data_dir);
    let config = ServerConfig::new(args.host, args.port, data_dir);

    info!("Starting teamscope server on {}", config.addr());

    let server = TeamscopeServer::new(config)?;
    server.run().await.map_err(Into::into)
}
