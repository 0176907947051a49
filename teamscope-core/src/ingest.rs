//! The ingest pipeline: the synchronous hook-side path.
//!
//! Parse, classify, store, notify. This path runs inside the host
//! runtime's hook window and is failure-opaque: [`IngestPipeline::ingest`]
//! returns the same [`Ack`] whether everything worked or nothing did, and
//! failures go to the log instead.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::bridge::{NotificationBridge, PendingNotification};
use crate::classify::normalize;
use crate::error::CoreError;
use crate::record::RawRecord;
use crate::storage::{EventStore, NewEvent};
use crate::transcript;

/// Uniform acknowledgment returned to hook adapters. Serializes to `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Ack {}

/// Phases that end a session and may carry a transcript to back-fill.
const STOP_PHASES: [&str; 2] = ["Stop", "SubagentStop"];

/// The path a hook record takes: classify, store, hand to live streams.
pub struct IngestPipeline {
    store: Arc<dyn EventStore>,
    bridge: NotificationBridge,
}

impl IngestPipeline {
    pub fn new(store: Arc<dyn EventStore>, bridge: NotificationBridge) -> Self {
        Self { store, bridge }
    }

    /// Ingest one raw record, acknowledging unconditionally.
    pub fn ingest(&self, record: &RawRecord) -> Ack {
        if let Err(err) = self.try_ingest(record) {
            tracing::warn!(
                error = %err,
                hook_event = %record.hook_event,
                "ingest failed, acknowledging anyway"
            );
        }
        Ack::default()
    }

    fn try_ingest(&self, record: &RawRecord) -> Result<(), CoreError> {
        let now = Utc::now();
        let event = normalize(record, now);
        let id = self.store.insert(&event)?;
        self.notify(id, &event);

        if let Some(path) = record.transcript_path.as_deref()
            && STOP_PHASES.contains(&record.hook_event.as_str())
        {
            self.backfill(path, &event, now)?;
        }
        Ok(())
    }

    /// Replay the transcript behind a stop record. Drafts get synthetic
    /// timestamps stepping one millisecond at a time past the stop event,
    /// so their relative order survives into the log.
    fn backfill(
        &self,
        path: &str,
        stop_event: &NewEvent,
        base: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let drafts = transcript::reconstruct(
            path,
            &stop_event.agent_name,
            &stop_event.session_id,
            &stop_event.team_name,
        );
        if drafts.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = drafts.len(), path, "back-filling from transcript");

        for (step, draft) in drafts.into_iter().enumerate() {
            let stamp = base + Duration::milliseconds(step as i64 + 1);
            let event = draft.with_timestamp(stamp);
            let id = self.store.insert(&event)?;
            self.notify(id, &event);
        }
        Ok(())
    }

    /// Bridge publication is best-effort; the stream tail-poll recovers
    /// anything missed here.
    fn notify(&self, id: i64, event: &NewEvent) {
        let note = PendingNotification::from_new_event(id, event);
        if let Err(err) = self.bridge.publish(&note) {
            tracing::warn!(error = %err, id, "failed to publish notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{
        Agent, Event, EventPage, EventQuery, EventSummary, Session, SqliteEventStore,
        StatsSnapshot, StoreError,
    };

    struct FailingStore;

    impl EventStore for FailingStore {
        fn insert(&self, _event: &NewEvent) -> Result<i64, StoreError> {
            Err(StoreError::Migration("injected failure".to_string()))
        }
        fn query(&self, _query: &EventQuery) -> Result<EventPage, StoreError> {
            Err(StoreError::Migration("injected failure".to_string()))
        }
        fn get_by_id(&self, _id: i64) -> Result<Option<Event>, StoreError> {
            Err(StoreError::Migration("injected failure".to_string()))
        }
        fn list_agents(&self) -> Result<Vec<Agent>, StoreError> {
            Err(StoreError::Migration("injected failure".to_string()))
        }
        fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
            Err(StoreError::Migration("injected failure".to_string()))
        }
        fn recent(&self, _limit: u32) -> Result<Vec<EventSummary>, StoreError> {
            Err(StoreError::Migration("injected failure".to_string()))
        }
        fn stats(&self) -> Result<StatsSnapshot, StoreError> {
            Err(StoreError::Migration("injected failure".to_string()))
        }
    }

    fn pipeline_in(dir: &std::path::Path) -> IngestPipeline {
        let store = Arc::new(SqliteEventStore::open_in_memory().unwrap());
        let bridge = NotificationBridge::new(dir.join("pending"));
        IngestPipeline::new(store, bridge)
    }

    #[test]
    fn test_ack_serializes_to_empty_object() {
        assert_eq!(serde_json::to_string(&Ack::default()).unwrap(), "{}");
    }

    #[test]
    fn test_ingest_stores_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_in(dir.path());

        let record = RawRecord::from_json(
            r#"{"session_id": "scout-1", "hook_event_name": "PostToolUse",
                "tool_name": "Bash", "tool_input": {"command": "ls"}}"#,
        );
        pipeline.ingest(&record);

        let page = pipeline.store.query(&EventQuery::new()).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.events[0].summary, "Bash: ls");

        let notes = pipeline.bridge.drain_pending();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, page.events[0].id);
        assert_eq!(notes[0].summary, "Bash: ls");
    }

    #[test]
    fn test_ingest_acks_on_store_failure() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = NotificationBridge::new(dir.path().join("pending"));
        let pipeline = IngestPipeline::new(Arc::new(FailingStore), bridge);

        let ack = pipeline.ingest(&RawRecord::default());
        assert_eq!(ack, Ack::default());
        // Nothing reached the bridge either.
        assert!(pipeline.bridge.drain_pending().is_empty());
    }

    #[test]
    fn test_stop_with_transcript_backfills() {
        let dir = tempfile::tempdir().unwrap();
        let transcript_path = dir.path().join("transcript.jsonl");
        std::fs::write(
            &transcript_path,
            concat!(
                r#"{"role": "assistant", "content": [{"type": "tool_use", "name": "Read", "input": {"file_path": "/a"}}]}"#,
                "\n",
                r#"{"role": "assistant", "content": [{"type": "tool_use", "name": "Bash", "input": {"command": "ls"}}]}"#,
            ),
        )
        .unwrap();

        let pipeline = pipeline_in(dir.path());
        let record = RawRecord {
            session_id: "scout-42".to_string(),
            hook_event: "Stop".to_string(),
            transcript_path: Some(transcript_path.display().to_string()),
            ..Default::default()
        };
        pipeline.ingest(&record);

        let query = EventQuery {
            page_size: 10,
            ..Default::default()
        };
        let page = pipeline.store.query(&query).unwrap();
        assert_eq!(page.total, 3);

        // Insertion order: stop first, then drafts in transcript order.
        let mut by_id = page.events.clone();
        by_id.sort_by_key(|e| e.id);
        assert_eq!(by_id[0].hook_event, "Stop");
        assert_eq!(by_id[1].summary, "Read: /a");
        assert_eq!(by_id[2].summary, "Bash: ls");

        // Drafts inherit the stop record's identity and step forward in
        // time, strictly increasing.
        assert_eq!(by_id[1].agent_name, "scout");
        assert!(by_id[1].timestamp > by_id[0].timestamp);
        assert!(by_id[2].timestamp > by_id[1].timestamp);

        // Every stored event reached the bridge.
        let notes = pipeline.bridge.drain_pending();
        assert_eq!(notes.len(), 3);
    }

    #[test]
    fn test_non_stop_phase_ignores_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let transcript_path = dir.path().join("transcript.jsonl");
        std::fs::write(
            &transcript_path,
            r#"{"role": "assistant", "content": [{"type": "tool_use", "name": "Bash", "input": {}}]}"#,
        )
        .unwrap();

        let pipeline = pipeline_in(dir.path());
        let record = RawRecord {
            session_id: "scout-42".to_string(),
            hook_event: "PostToolUse".to_string(),
            tool_name: "Bash".to_string(),
            transcript_path: Some(transcript_path.display().to_string()),
            ..Default::default()
        };
        pipeline.ingest(&record);

        assert_eq!(pipeline.store.query(&EventQuery::new()).unwrap().total, 1);
    }

    #[test]
    fn test_stop_without_transcript_stores_one_event() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_in(dir.path());
        let record = RawRecord {
            session_id: "scout-42".to_string(),
            hook_event: "Stop".to_string(),
            ..Default::default()
        };
        pipeline.ingest(&record);

        let page = pipeline.store.query(&EventQuery::new()).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.events[0].summary, "Agent stopped");
    }

    #[test]
    fn test_stop_with_missing_transcript_still_stores_stop() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_in(dir.path());
        let record = RawRecord {
            session_id: "scout-42".to_string(),
            hook_event: "SubagentStop".to_string(),
            transcript_path: Some("/nonexistent/transcript.jsonl".to_string()),
            ..Default::default()
        };
        let ack = pipeline.ingest(&record);
        assert_eq!(ack, Ack::default());
        assert_eq!(pipeline.store.query(&EventQuery::new()).unwrap().total, 1);
    }
}
