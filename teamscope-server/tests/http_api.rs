//! HTTP API tests over a file-backed store
//!
//! Records enter through the real ingest path and come back out through
//! the REST surface:
//! - the feed returns ingested events newest first, filtered and paginated
//! - the detail endpoint decodes stored payloads
//! - agents and stats reflect the rollups
//! - error responses carry the JSON error shape

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;
use teamscope_core::{
    EventPage, IngestPipeline, NotificationBridge, RawRecord, SqliteEventStore, StatsSnapshot,
};
use teamscope_server::http::AgentsResponse;
use teamscope_server::{create_router, AppState};

fn seeded_server(dir: &tempfile::TempDir) -> TestServer {
    let store = Arc::new(SqliteEventStore::open(dir.path().join("teamscope.db")).unwrap());
    let bridge = NotificationBridge::new(dir.path().join("pending"));
    let pipeline = IngestPipeline::new(store.clone(), bridge);

    pipeline.ingest(&RawRecord::from_json(
        r#"{"session_id": "lead-1", "hook_event_name": "SubagentStart",
            "tool_input": {"name": "scout", "team_name": "alpha"}}"#,
    ));
    pipeline.ingest(&RawRecord::from_json(
        r#"{"session_id": "scout-2", "hook_event_name": "PostToolUse", "team_name": "alpha",
            "tool_name": "Bash", "tool_input": {"command": "cargo metadata"}}"#,
    ));
    pipeline.ingest(&RawRecord::from_json(
        r#"{"session_id": "scout-2", "hook_event_name": "PostToolUse", "team_name": "alpha",
            "tool_name": "SendMessage",
            "tool_input": {"type": "broadcast", "summary": "sweep done"}}"#,
    ));

    let state = Arc::new(AppState::new(
        store,
        Arc::new(NotificationBridge::new(dir.path().join("pending"))),
    ));
    TestServer::new(create_router(state)).unwrap()
}

#[tokio::test]
async fn ingested_records_surface_through_the_api() {
    let dir = tempfile::tempdir().unwrap();
    let server = seeded_server(&dir);

    let health: Value = server.get("/api/health").await.json();
    assert_eq!(health["status"], "ok");

    let page: EventPage = server.get("/api/events").await.json();
    assert_eq!(page.total, 3);
    assert_eq!(page.events[0].summary, "Broadcast: sweep done");
    assert_eq!(page.events[1].summary, "Bash: cargo metadata");
    assert_eq!(page.events[2].summary, "Subagent started: scout");

    let filtered: EventPage = server
        .get("/api/events")
        .add_query_param("category", "communication")
        .await
        .json();
    assert_eq!(filtered.total, 1);
    assert_eq!(filtered.events[0].agent_name, "scout");

    // Detail view decodes the stored payload back into JSON.
    let spawn_id = page.events[2].id;
    let detail: Value = server
        .get(&format!("/api/events/{}", spawn_id))
        .await
        .json();
    assert_eq!(detail["payload"]["tool_input"]["name"], "scout");
    assert_eq!(detail["agent_name"], "scout");

    let agents: AgentsResponse = server.get("/api/agents").await.json();
    assert_eq!(agents.agents.len(), 1);
    assert_eq!(agents.agents[0].agent_name, "scout");
    assert_eq!(agents.agents[0].event_count, 3);

    let stats: StatsSnapshot = server.get("/api/stats").await.json();
    assert_eq!(stats.total_events, 3);
    assert_eq!(stats.by_category.get("communication"), Some(&1));
    assert_eq!(stats.by_category.get("tool_use"), Some(&1));
    assert_eq!(stats.by_category.get("lifecycle"), Some(&1));
}

#[tokio::test]
async fn feed_pagination_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteEventStore::open(dir.path().join("teamscope.db")).unwrap());
    let pipeline = IngestPipeline::new(
        store.clone(),
        NotificationBridge::new(dir.path().join("pending")),
    );
    for i in 0..5 {
        pipeline.ingest(&RawRecord::from_json(&format!(
            r#"{{"session_id": "scout-2", "hook_event_name": "PostToolUse",
                "tool_name": "Bash", "tool_input": {{"command": "step {}"}}}}"#,
            i
        )));
    }
    let state = Arc::new(AppState::new(
        store,
        Arc::new(NotificationBridge::new(dir.path().join("pending"))),
    ));
    let server = TestServer::new(create_router(state)).unwrap();

    let page: EventPage = server
        .get("/api/events")
        .add_query_param("page", "2")
        .add_query_param("page_size", "2")
        .await
        .json();
    assert_eq!(page.total, 5);
    assert_eq!(page.page, 2);
    assert_eq!(page.page_size, 2);
    assert_eq!(page.page_count, 3);
    assert_eq!(page.events.len(), 2);
    assert_eq!(page.events[0].summary, "Bash: step 2");
    assert_eq!(page.events[1].summary, "Bash: step 1");
}

#[tokio::test]
async fn bad_requests_get_json_errors() {
    let dir = tempfile::tempdir().unwrap();
    let server = seeded_server(&dir);

    let response = server
        .get("/api/events")
        .add_query_param("category", "bogus")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_CATEGORY");

    let response = server.get("/api/events/99999").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "not found");
}
