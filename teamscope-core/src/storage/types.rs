//! Stored event and aggregate types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::EventCategory;

/// Insert-ready event produced by classification. The id is assigned by
/// the store at insert time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub team_name: String,
    pub agent_name: String,
    pub hook_event: String,
    pub tool_name: String,
    pub category: EventCategory,
    pub summary: String,
    pub payload_json: String,
}

/// A stored event, payload included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub team_name: String,
    pub agent_name: String,
    pub hook_event: String,
    pub tool_name: String,
    pub event_category: EventCategory,
    pub summary: String,
    pub payload_json: String,
}

/// The list-shape row: everything but the payload. Feed pages and the
/// stream tail-poll carry these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub team_name: String,
    pub agent_name: String,
    pub hook_event: String,
    pub tool_name: String,
    pub event_category: EventCategory,
    pub summary: String,
}

/// Per-agent rollup, maintained in the same transaction as each event
/// insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub agent_name: String,
    pub team_name: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub event_count: i64,
}

/// Per-session rollup, maintained like [`Agent`]. A session's end is
/// only ever provisional; ended_at tracks its latest event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub team_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub event_count: i64,
}

/// Point-in-time dashboard aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_events: i64,
    /// Counts keyed by category name; only categories with events appear.
    pub by_category: BTreeMap<String, i64>,
    pub most_active_agent: Option<AgentActivity>,
    pub events_last_minute: i64,
}

/// The busiest agent and its lifetime event count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentActivity {
    pub agent_name: String,
    pub event_count: i64,
}
