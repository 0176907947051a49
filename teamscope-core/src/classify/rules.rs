//! Classification rules: raw records to categories and summaries.
//!
//! Classification walks a fixed precedence: lifecycle phases are
//! recognized before tool names, messaging tools before task tools,
//! task tools before generic tool use, and anything left over is filed
//! as lifecycle.

use serde_json::Value;

use super::category::EventCategory;
use super::identity::{field_text, input_str};
use crate::record::RawRecord;

/// Character limit for caller-supplied text embedded in a summary.
pub const SUMMARY_TEXT_LIMIT: usize = 60;

/// Spawn descriptions get a shorter cut.
const DESCRIPTION_LIMIT: usize = 40;

/// Category plus one-line summary for a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: EventCategory,
    pub summary: String,
}

impl Classification {
    fn new(category: EventCategory, summary: impl Into<String>) -> Self {
        Self {
            category,
            summary: summary.into(),
        }
    }
}

/// Classify a raw record into a category and a one-line summary.
///
/// Total over all inputs: an empty record classifies as lifecycle with
/// the summary `"unknown event"`.
pub fn classify(record: &RawRecord) -> Classification {
    if let Some(classification) = classify_phase(record) {
        return classification;
    }
    if record.tool_name == "SendMessage" {
        return classify_message(&record.tool_input);
    }
    if let Some(classification) = classify_task_tool(record) {
        return classification;
    }
    if !record.tool_name.is_empty() {
        return classify_tool(record);
    }
    let summary = if record.hook_event.is_empty() {
        "unknown event".to_string()
    } else {
        record.hook_event.clone()
    };
    Classification::new(EventCategory::Lifecycle, summary)
}

/// Lifecycle phases override whatever tool the record mentions.
fn classify_phase(record: &RawRecord) -> Option<Classification> {
    let input = &record.tool_input;
    let summary = match record.hook_event.as_str() {
        "Stop" => "Agent stopped".to_string(),
        "SubagentStop" => "Subagent stopped".to_string(),
        "SubagentStart" => match input_str(input, "name") {
            Some(name) => format!("Subagent started: {}", truncate(name, SUMMARY_TEXT_LIMIT)),
            None => match input_str(input, "description") {
                Some(description) => format!(
                    "Subagent started: {}",
                    truncate(description, DESCRIPTION_LIMIT)
                ),
                None => "Subagent started".to_string(),
            },
        },
        "Notification" => {
            let message = input_str(input, "message")
                .map(str::to_string)
                .unwrap_or_else(|| result_text(&record.tool_result));
            format!("Notification: {}", truncate(&message, SUMMARY_TEXT_LIMIT))
        }
        _ => return None,
    };
    Some(Classification::new(EventCategory::Lifecycle, summary))
}

/// SendMessage carries a `type` discriminator; plain messages omit it.
fn classify_message(input: &Value) -> Classification {
    let kind = input_str(input, "type").unwrap_or("message");
    let summary = match kind {
        "broadcast" => format!("Broadcast: {}", message_summary_text(input)),
        "shutdown_request" => format!(
            "Shutdown request to {}",
            truncate(&field_text(input, "recipient"), SUMMARY_TEXT_LIMIT)
        ),
        "shutdown_response" => {
            let approved = input.get("approve").and_then(Value::as_bool).unwrap_or(false);
            let verdict = if approved { "approved" } else { "rejected" };
            format!("Shutdown response: {verdict}")
        }
        _ => format!(
            "DM to {}: {}",
            truncate(&field_text(input, "recipient"), SUMMARY_TEXT_LIMIT),
            message_summary_text(input)
        ),
    };
    Classification::new(EventCategory::Communication, summary)
}

/// Prefer the sender-provided summary, else the leading slice of content.
fn message_summary_text(input: &Value) -> String {
    let text = input_str(input, "summary")
        .or_else(|| input_str(input, "content"))
        .unwrap_or_default();
    truncate(text, SUMMARY_TEXT_LIMIT)
}

fn classify_task_tool(record: &RawRecord) -> Option<Classification> {
    let input = &record.tool_input;
    let summary = match record.tool_name.as_str() {
        "TaskCreate" => format!(
            "Created task: {}",
            truncate(&field_text(input, "subject"), SUMMARY_TEXT_LIMIT)
        ),
        "TaskUpdate" => task_update_summary(input),
        "TaskList" => "Listed tasks".to_string(),
        "TaskGet" => format!("Got task #{}", field_text(input, "taskId")),
        "TeamCreate" => format!(
            "Created team: {}",
            truncate(&field_text(input, "team_name"), SUMMARY_TEXT_LIMIT)
        ),
        _ => return None,
    };
    Some(Classification::new(EventCategory::TaskManagement, summary))
}

/// An update naming an owner reads as an assignment; owner beats status
/// when both are present.
fn task_update_summary(input: &Value) -> String {
    let task_id = field_text(input, "taskId");
    if let Some(owner) = input_str(input, "owner") {
        return format!(
            "Assigned task #{task_id} to {}",
            truncate(owner, SUMMARY_TEXT_LIMIT)
        );
    }
    if let Some(status) = input_str(input, "status") {
        return format!(
            "Updated task #{task_id}: {}",
            truncate(status, SUMMARY_TEXT_LIMIT)
        );
    }
    format!("Updated task #{task_id}")
}

/// Well-known tools get their most informative argument in the summary;
/// unrecognized tools fall back to the bare tool name.
fn classify_tool(record: &RawRecord) -> Classification {
    let input = &record.tool_input;
    let tool = record.tool_name.as_str();
    let summary = match tool {
        "Bash" => labeled(tool, input, "command"),
        "Edit" | "Write" | "Read" => labeled(tool, input, "file_path"),
        "Glob" | "Grep" => labeled(tool, input, "pattern"),
        "WebFetch" => labeled(tool, input, "url"),
        "WebSearch" => labeled(tool, input, "query"),
        other => other.to_string(),
    };
    Classification::new(EventCategory::ToolUse, summary)
}

fn labeled(tool: &str, input: &Value, key: &str) -> String {
    format!(
        "{tool}: {}",
        truncate(&field_text(input, key), SUMMARY_TEXT_LIMIT)
    )
}

fn result_text(result: &Value) -> String {
    match result {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Cut text at `limit` characters. Counting is by character, so multibyte
/// text never splits inside a code point.
pub(crate) fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        text.chars().take(limit).collect()
    }
}
