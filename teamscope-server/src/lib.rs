//! teamscope-server - HTTP and SSE server for the teamscope dashboard
//!
//! This crate owns the opened event store and the notification bridge.
//! Query endpoints read the store directly; `/api/stream` runs one
//! [`StreamMerger`] loop per connected client.

mod error;
pub mod http;
mod state;
pub mod stream;

use std::path::PathBuf;
use std::sync::Arc;

use teamscope_core::{DB_FILE, NotificationBridge, QUEUE_DIR, SqliteEventStore};
use tokio::net::TcpListener;

pub use error::ServerError;
pub use http::create_router;
pub use state::AppState;
pub use stream::{StreamConfig, StreamFrame, StreamMerger};

/// Default port the dashboard binds to
pub const DEFAULT_PORT: u16 = 5111;

/// The main teamscope server
pub struct TeamscopeServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl TeamscopeServer {
    /// Open the store and queue under the configured data directory.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let store = SqliteEventStore::open(config.data_dir.join(DB_FILE))
            .map_err(|e| ServerError::Internal(format!("Failed to open event store: {}", e)))?;
        let bridge = NotificationBridge::new(config.data_dir.join(QUEUE_DIR));
        let state = Arc::new(AppState::new(Arc::new(store), Arc::new(bridge)));

        Ok(Self { config, state })
    }

    /// Create a server with custom state (for testing)
    pub fn with_state(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("teamscope server listening on {}", addr);

        let router = create_router(self.state);
        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Directory holding the event database and notification queue
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            data_dir: teamscope_paths::data_dir(),
        }
    }
}

impl ServerConfig {
    /// Create a ServerConfig with the specified host, port, and data directory
    pub fn new(host: impl Into<String>, port: u16, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            port,
            data_dir: data_dir.into(),
        }
    }

    /// Returns the socket address string (e.g., "127.0.0.1:5111")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
