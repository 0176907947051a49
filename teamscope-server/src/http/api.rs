//! REST API handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use teamscope_core::{Agent, Event, EventCategory, EventQuery};

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
}

/// Health check endpoint
///
/// Returns server status, version, and uptime.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Query params for the event feed
#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub category: Option<String>,
    pub agent: Option<String>,
    pub tool: Option<String>,
}

impl TryFrom<ListEventsQuery> for EventQuery {
    type Error = String;

    /// Fails with the offending value when the category name is unknown.
    fn try_from(q: ListEventsQuery) -> Result<Self, Self::Error> {
        let category = match q.category {
            Some(raw) => Some(EventCategory::parse(&raw).ok_or(raw)?),
            None => None,
        };
        let defaults = EventQuery::default();
        Ok(Self {
            page: q.page.unwrap_or(defaults.page),
            page_size: q.page_size.unwrap_or(defaults.page_size),
            category,
            agent: q.agent,
            tool: q.tool,
        })
    }
}

/// GET /api/events
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListEventsQuery>,
) -> impl IntoResponse {
    let query = match EventQuery::try_from(query) {
        Ok(query) => query,
        Err(raw) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Unknown category: {}", raw),
                    code: "INVALID_CATEGORY".into(),
                }),
            )
                .into_response();
        }
    };

    match state.store.query(&query) {
        Ok(page) => Json(page).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
                code: "INTERNAL_ERROR".into(),
            }),
        )
            .into_response(),
    }
}

/// Full event for the detail view
#[derive(Debug, Serialize)]
pub struct EventDetail {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub team_name: String,
    pub agent_name: String,
    pub hook_event: String,
    pub tool_name: String,
    pub event_category: EventCategory,
    pub summary: String,
    /// Decoded payload; the raw string when it does not parse as JSON
    pub payload: Value,
}

impl From<Event> for EventDetail {
    fn from(event: Event) -> Self {
        let payload = serde_json::from_str(&event.payload_json)
            .unwrap_or_else(|_| Value::String(event.payload_json.clone()));
        Self {
            id: event.id,
            timestamp: event.timestamp,
            session_id: event.session_id,
            team_name: event.team_name,
            agent_name: event.agent_name,
            hook_event: event.hook_event,
            tool_name: event.tool_name,
            event_category: event.event_category,
            summary: event.summary,
            payload,
        }
    }
}

/// GET /api/events/:id
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.store.get_by_id(id) {
        Ok(Some(event)) => Json(EventDetail::from(event)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "not found".into(),
                code: "NOT_FOUND".into(),
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
                code: "INTERNAL_ERROR".into(),
            }),
        )
            .into_response(),
    }
}

/// Response for listing agents
#[derive(Debug, Serialize, Deserialize)]
pub struct AgentsResponse {
    /// Agent rollups, most recently active first
    pub agents: Vec<Agent>,
}

/// GET /api/agents
pub async fn list_agents(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.list_agents() {
        Ok(agents) => Json(AgentsResponse { agents }).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
                code: "INTERNAL_ERROR".into(),
            }),
        )
            .into_response(),
    }
}

/// GET /api/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.stats() {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
                code: "INTERNAL_ERROR".into(),
            }),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use axum_test::TestServer;
    use teamscope_core::{
        EventPage, EventStore, NewEvent, NotificationBridge, SqliteEventStore, StatsSnapshot,
    };

    fn test_state() -> Arc<AppState> {
        let store: Arc<dyn EventStore> = Arc::new(SqliteEventStore::open_in_memory().unwrap());
        let bridge = Arc::new(NotificationBridge::new(
            std::env::temp_dir().join("teamscope-api-tests"),
        ));
        Arc::new(AppState::new(store, bridge))
    }

    fn create_test_app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/api/health", get(health))
            .route("/api/events", get(list_events))
            .route("/api/events/:id", get(get_event))
            .route("/api/agents", get(list_agents))
            .route("/api/stats", get(stats))
            .with_state(state)
    }

    fn new_event(agent: &str, tool: &str, category: EventCategory, summary: &str) -> NewEvent {
        NewEvent {
            timestamp: Utc::now(),
            session_id: format!("{}-7c1f", agent),
            team_name: "alpha".to_string(),
            agent_name: agent.to_string(),
            hook_event: "PreToolUse".to_string(),
            tool_name: tool.to_string(),
            category,
            summary: summary.to_string(),
            payload_json: r#"{"tool_input":{"command":"ls"}}"#.to_string(),
        }
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = TestServer::new(create_test_app(test_state())).unwrap();

        let response = server.get("/api/health").await;
        response.assert_status_ok();

        let body: HealthResponse = response.json();
        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
        assert!(body.uptime_seconds >= 0);
    }

    #[tokio::test]
    async fn test_list_events_empty() {
        let server = TestServer::new(create_test_app(test_state())).unwrap();

        let response = server.get("/api/events").await;
        response.assert_status_ok();

        let body: EventPage = response.json();
        assert!(body.events.is_empty());
        assert_eq!(body.total, 0);
        assert_eq!(body.page_count, 0);
    }

    #[tokio::test]
    async fn test_list_events_filters_by_category_and_agent() {
        let state = test_state();
        let store = Arc::clone(&state.store);
        store
            .insert(&new_event("scout", "Bash", EventCategory::ToolUse, "one"))
            .unwrap();
        store
            .insert(&new_event("scout", "Bash", EventCategory::ToolUse, "two"))
            .unwrap();
        store
            .insert(&new_event("planner", "", EventCategory::Lifecycle, "stopped"))
            .unwrap();
        let server = TestServer::new(create_test_app(state)).unwrap();

        let response = server
            .get("/api/events")
            .add_query_param("category", "tool_use")
            .add_query_param("agent", "scout")
            .await;
        response.assert_status_ok();

        let body: EventPage = response.json();
        assert_eq!(body.total, 2);
        // Newest first
        assert_eq!(body.events[0].summary, "two");
        assert_eq!(body.events[1].summary, "one");
    }

    #[tokio::test]
    async fn test_list_events_rejects_unknown_category() {
        let server = TestServer::new(create_test_app(test_state())).unwrap();

        let response = server
            .get("/api/events")
            .add_query_param("category", "bogus")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_CATEGORY");
    }

    #[tokio::test]
    async fn test_event_detail_decodes_payload() {
        let state = test_state();
        let id = state
            .store
            .insert(&new_event("scout", "Bash", EventCategory::ToolUse, "ran ls"))
            .unwrap();
        let server = TestServer::new(create_test_app(state)).unwrap();

        let response = server.get(&format!("/api/events/{}", id)).await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["summary"], "ran ls");
        assert_eq!(body["payload"]["tool_input"]["command"], "ls");
        // The raw column does not leak into the response
        assert!(body.get("payload_json").is_none());
    }

    #[tokio::test]
    async fn test_event_detail_not_found() {
        let server = TestServer::new(create_test_app(test_state())).unwrap();

        let response = server.get("/api/events/999").await;
        response.assert_status(StatusCode::NOT_FOUND);

        let body: Value = response.json();
        assert_eq!(body["error"], "not found");
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_agents_listed_most_recent_first() {
        let state = test_state();
        state
            .store
            .insert(&new_event("scout", "Bash", EventCategory::ToolUse, "one"))
            .unwrap();
        state
            .store
            .insert(&new_event("planner", "Read", EventCategory::ToolUse, "two"))
            .unwrap();
        let server = TestServer::new(create_test_app(state)).unwrap();

        let response = server.get("/api/agents").await;
        response.assert_status_ok();

        let body: AgentsResponse = response.json();
        assert_eq!(body.agents.len(), 2);
        assert_eq!(body.agents[0].team_name, "alpha");
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let state = test_state();
        state
            .store
            .insert(&new_event("scout", "Bash", EventCategory::ToolUse, "one"))
            .unwrap();
        let server = TestServer::new(create_test_app(state)).unwrap();

        let response = server.get("/api/stats").await;
        response.assert_status_ok();

        let body: StatsSnapshot = response.json();
        assert_eq!(body.total_events, 1);
        assert_eq!(body.by_category.get("tool_use"), Some(&1));
    }
}
