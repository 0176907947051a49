//! Event category taxonomy.

use serde::{Deserialize, Serialize};

/// The four buckets every stored event falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Session phases: starts, stops, notifications, unmatched records.
    Lifecycle,
    /// Inter-agent messaging: DMs, broadcasts, shutdown handshakes.
    Communication,
    /// Task and team bookkeeping tools.
    TaskManagement,
    /// Everything an agent does with ordinary tools.
    ToolUse,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Lifecycle => "lifecycle",
            EventCategory::Communication => "communication",
            EventCategory::TaskManagement => "task_management",
            EventCategory::ToolUse => "tool_use",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lifecycle" => Some(EventCategory::Lifecycle),
            "communication" => Some(EventCategory::Communication),
            "task_management" => Some(EventCategory::TaskManagement),
            "tool_use" => Some(EventCategory::ToolUse),
            _ => None,
        }
    }
}
