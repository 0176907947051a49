//! HTTP server module

mod api;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::stream;
use crate::AppState;

pub use api::{AgentsResponse, ErrorResponse, EventDetail, HealthResponse, ListEventsQuery};

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/events", get(api::list_events))
        .route("/api/events/:id", get(api::get_event))
        .route("/api/agents", get(api::list_agents))
        .route("/api/stats", get(api::stats))
        .route("/api/stream", get(stream::stream_events))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use teamscope_core::{NotificationBridge, SqliteEventStore};

    #[tokio::test]
    async fn test_router_has_health_endpoint() {
        let store = Arc::new(SqliteEventStore::open_in_memory().unwrap());
        let bridge = Arc::new(NotificationBridge::new(
            std::env::temp_dir().join("teamscope-router-tests"),
        ));
        let state = Arc::new(AppState::new(store, bridge));
        let router = create_router(state);
        let server = TestServer::new(router).unwrap();

        let response = server.get("/api/health").await;
        response.assert_status_ok();
    }
}
