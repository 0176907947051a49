//! Agent and team identity extraction.
//!
//! Identity is derived, not authoritative: hooks report it inconsistently
//! across phases, so each field is resolved through a fixed precedence
//! chain and bottoms out at `"unknown"` rather than failing.

use serde_json::Value;

use crate::record::RawRecord;

pub(crate) const UNKNOWN: &str = "unknown";

/// Resolve the acting agent for a record.
///
/// Precedence: explicit `name` in the tool input (spawn and messaging
/// tools carry one), then the adapter-supplied agent name, then the
/// session-id prefix before the first hyphen.
pub fn agent_name(record: &RawRecord) -> String {
    if let Some(name) = input_str(&record.tool_input, "name") {
        return name.to_string();
    }
    if !record.agent_name.is_empty() {
        return record.agent_name.clone();
    }
    session_prefix(&record.session_id).unwrap_or_else(|| UNKNOWN.to_string())
}

/// Resolve the team for a record: `team_name` in the tool input, then the
/// adapter-supplied team name.
pub fn team_name(record: &RawRecord) -> String {
    team_from_input(&record.tool_input).unwrap_or_else(|| {
        if record.team_name.is_empty() {
            UNKNOWN.to_string()
        } else {
            record.team_name.clone()
        }
    })
}

pub(crate) fn team_from_input(input: &Value) -> Option<String> {
    input_str(input, "team_name").map(str::to_string)
}

/// Team-session ids look like `<agent>-<suffix>`; the prefix names the
/// agent. A lone id with no hyphen is used whole.
fn session_prefix(session_id: &str) -> Option<String> {
    if session_id.is_empty() {
        return None;
    }
    let prefix = match session_id.split_once('-') {
        Some((prefix, _)) => prefix,
        None => session_id,
    };
    if prefix.is_empty() {
        None
    } else {
        Some(prefix.to_string())
    }
}

/// Fetch a non-empty string field from a tool input object.
pub(crate) fn input_str<'a>(input: &'a Value, key: &str) -> Option<&'a str> {
    input
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Render a tool-input field as text, accepting strings and numbers.
/// Task ids in particular arrive as either.
pub(crate) fn field_text(input: &Value, key: &str) -> String {
    match input.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
