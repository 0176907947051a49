//! Transcript reconstruction: recovering events from turn logs.
//!
//! Teammate transcripts are JSONL, one turn per line. Live capture can
//! miss tool activity inside a teammate's session, so at session stop the
//! transcript is replayed: every `tool_use` block in an assistant turn
//! becomes a draft event, classified exactly like a live record. Drafts
//! carry no timestamp; the ingest pipeline assigns synthetic ones so the
//! originals' relative order survives.
//!
//! Parsing is tolerant at every level: unreadable files yield nothing,
//! malformed lines are skipped, and a bad block never poisons its
//! neighbors. Tool-result blocks are skipped outright since the tool use
//! itself already produced a draft.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::classify::identity::{UNKNOWN, input_str, team_from_input};
use crate::classify::{Classification, EventCategory, classify};
use crate::record::{MAX_RESULT_BYTES, RawRecord, TRUNCATION_MARKER};
use crate::storage::NewEvent;

/// Phase recorded on reconstructed events.
pub const SYNTHETIC_PHASE: &str = "PostToolUse";

/// A reconstructed event awaiting a synthetic timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub session_id: String,
    pub team_name: String,
    pub agent_name: String,
    pub hook_event: String,
    pub tool_name: String,
    pub category: EventCategory,
    pub summary: String,
    pub payload_json: String,
}

impl EventDraft {
    /// Stamp the draft into an insert-ready event.
    pub fn with_timestamp(self, timestamp: DateTime<Utc>) -> NewEvent {
        NewEvent {
            timestamp,
            session_id: self.session_id,
            team_name: self.team_name,
            agent_name: self.agent_name,
            hook_event: self.hook_event,
            tool_name: self.tool_name,
            category: self.category,
            summary: self.summary,
            payload_json: self.payload_json,
        }
    }
}

/// One line of a transcript.
#[derive(Debug, Clone, Deserialize)]
struct TurnEntry {
    #[serde(default)]
    role: String,
    /// A list of content blocks in practice; anything else means no blocks.
    #[serde(default)]
    content: Value,
}

/// One content block inside an assistant turn. Anything that is not a
/// tool use (text, thinking, tool results) falls into `Other`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    ToolUse {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

/// Replay a transcript file into event drafts, in transcript order.
///
/// `default_agent` and `default_team` attribute the drafts; a block's own
/// identity fields are consulted only when the defaults carry nothing.
pub fn reconstruct(
    path: impl AsRef<Path>,
    default_agent: &str,
    session_id: &str,
    default_team: &str,
) -> Vec<EventDraft> {
    let contents = match std::fs::read_to_string(path.as_ref()) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::debug!(
                path = %path.as_ref().display(),
                error = %err,
                "transcript not readable, nothing to reconstruct"
            );
            return Vec::new();
        }
    };
    drafts_from_jsonl(&contents, default_agent, session_id, default_team)
}

fn drafts_from_jsonl(
    contents: &str,
    default_agent: &str,
    session_id: &str,
    default_team: &str,
) -> Vec<EventDraft> {
    let mut drafts = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(entry) = serde_json::from_str::<TurnEntry>(line) else {
            continue;
        };
        if entry.role != "assistant" {
            continue;
        }
        let Some(blocks) = entry.content.as_array() else {
            continue;
        };
        for block in blocks {
            let Ok(ContentBlock::ToolUse { name, input }) =
                serde_json::from_value::<ContentBlock>(block.clone())
            else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            drafts.push(draft_from_tool_use(
                name,
                input,
                default_agent,
                session_id,
                default_team,
            ));
        }
    }
    drafts
}

fn draft_from_tool_use(
    name: String,
    input: Value,
    default_agent: &str,
    session_id: &str,
    default_team: &str,
) -> EventDraft {
    let record = RawRecord {
        session_id: session_id.to_string(),
        hook_event: SYNTHETIC_PHASE.to_string(),
        tool_name: name,
        tool_input: input,
        ..Default::default()
    };
    let Classification { category, summary } = classify(&record);

    let agent_name = if default_agent.is_empty() || default_agent == UNKNOWN {
        input_str(&record.tool_input, "name")
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN.to_string())
    } else {
        default_agent.to_string()
    };
    let team_name = if default_team.is_empty() || default_team == UNKNOWN {
        team_from_input(&record.tool_input).unwrap_or_else(|| UNKNOWN.to_string())
    } else {
        default_team.to_string()
    };
    let payload_json = draft_payload(&record);

    EventDraft {
        session_id: record.session_id,
        team_name,
        agent_name,
        hook_event: record.hook_event,
        tool_name: record.tool_name,
        category,
        summary,
        payload_json,
    }
}

fn draft_payload(record: &RawRecord) -> String {
    let payload = serde_json::json!({
        "hook_event_name": record.hook_event,
        "tool_name": record.tool_name,
        "tool_input": record.tool_input,
        "source": "transcript",
    });
    cap_payload(payload.to_string())
}

/// Whole-payload cap; reconstructed inputs have no single result field
/// to shrink, so the serialized form is cut as one piece.
fn cap_payload(serialized: String) -> String {
    if serialized.len() <= MAX_RESULT_BYTES {
        return serialized;
    }
    let mut end = MAX_RESULT_BYTES;
    while !serialized.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &serialized[..end], TRUNCATION_MARKER)
}
