//! Turning raw hook records into normalized events.
//!
//! Split in three: [`category`] holds the taxonomy, [`identity`] resolves
//! who acted, and [`rules`] maps a record to a category plus summary.
//! [`normalize`] ties them together into an insert-ready event.

mod category;
pub(crate) mod identity;
mod rules;

pub use category::EventCategory;
pub use rules::{Classification, SUMMARY_TEXT_LIMIT, classify};

use chrono::{DateTime, Utc};

use crate::record::RawRecord;
use crate::storage::NewEvent;

/// Normalize a raw record into an insert-ready event.
///
/// The timestamp is supplied by the caller: live ingestion stamps the
/// arrival time, transcript back-fill assigns synthetic times.
pub fn normalize(record: &RawRecord, timestamp: DateTime<Utc>) -> NewEvent {
    let Classification { category, summary } = classify(record);
    NewEvent {
        timestamp,
        session_id: record.session_id.clone(),
        team_name: identity::team_name(record),
        agent_name: identity::agent_name(record),
        hook_event: record.hook_event.clone(),
        tool_name: record.tool_name.clone(),
        category,
        summary,
        payload_json: record.payload_json(),
    }
}
