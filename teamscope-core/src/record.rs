//! Raw activity records as delivered by hook adapters.
//!
//! Hook payloads come from outside the process boundary and are treated as
//! untrusted: every field tolerates absence, and malformed input decodes to
//! an empty record instead of an error. An empty record still classifies
//! (to the lifecycle catch-all), so the ingest path never rejects input.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of bytes of a tool result kept in a stored payload.
pub const MAX_RESULT_BYTES: usize = 50 * 1024;

/// Marker appended when a payload field was cut at the cap.
pub(crate) const TRUNCATION_MARKER: &str = "...[truncated]";

/// One activity record received from the host runtime's hooks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    #[serde(
        default,
        rename = "hook_event_name",
        skip_serializing_if = "String::is_empty"
    )]
    pub hook_event: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub tool_input: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub tool_result: Value,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub agent_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,
    /// Adapter-specific fields we do not model; preserved in the payload.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl RawRecord {
    /// Decode a record from raw JSON. Malformed input yields an empty
    /// record rather than an error.
    pub fn from_json(raw: &str) -> RawRecord {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// Serialize the record for storage, capping the tool result at
    /// [`MAX_RESULT_BYTES`].
    pub fn payload_json(&self) -> String {
        let mut value = match serde_json::to_value(self) {
            Ok(value) => value,
            Err(_) => return "{}".to_string(),
        };
        if let Some(result) = value.get_mut("tool_result") {
            cap_value(result);
        }
        value.to_string()
    }
}

/// Replace an oversized value with its truncated string rendering.
fn cap_value(value: &mut Value) {
    let text = match value {
        Value::Null => return,
        Value::String(s) if s.len() <= MAX_RESULT_BYTES => return,
        Value::String(s) => s.clone(),
        ref other => {
            let rendered = other.to_string();
            if rendered.len() <= MAX_RESULT_BYTES {
                return;
            }
            rendered
        }
    };
    let mut end = MAX_RESULT_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    *value = Value::String(format!("{}{}", &text[..end], TRUNCATION_MARKER));
}
