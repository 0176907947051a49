//! Shared application state for the teamscope server

use std::sync::Arc;

use chrono::{DateTime, Utc};
use teamscope_core::{EventStore, NotificationBridge};

use crate::stream::StreamConfig;

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Event store backing the query endpoints and the stream tail-poll
    pub store: Arc<dyn EventStore>,
    /// Notification queue the ingest side publishes into
    pub bridge: Arc<NotificationBridge>,
    /// Pacing for per-client stream loops
    pub stream: StreamConfig,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state over an opened store and bridge
    pub fn new(store: Arc<dyn EventStore>, bridge: Arc<NotificationBridge>) -> Self {
        Self {
            store,
            bridge,
            stream: StreamConfig::default(),
            started_at: Utc::now(),
        }
    }

    /// Replace the stream pacing (for testing)
    pub fn with_stream_config(mut self, stream: StreamConfig) -> Self {
        self.stream = stream;
        self
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
