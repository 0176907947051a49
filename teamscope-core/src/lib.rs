//! teamscope-core: Core library for the teamscope agent-team monitor
//!
//! This crate provides the foundational components for teamscope:
//!
//! - **Raw records** - [`RawRecord`] for tolerant decoding of hook payloads
//! - **Classification** - [`classify`] for mapping records to categories and summaries
//! - **Transcript reconstruction** - [`transcript`] for back-filling events from turn logs
//! - **Event storage** - [`EventStore`] trait and [`SqliteEventStore`] for durable history
//! - **Notification bridge** - [`NotificationBridge`] for handing fresh events to live streams
//! - **Ingest pipeline** - [`IngestPipeline`] tying the hook-side path together
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use teamscope_core::{IngestPipeline, NotificationBridge, RawRecord, SqliteEventStore};
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(SqliteEventStore::open("teamscope.db")?);
//!     let bridge = NotificationBridge::new("pending");
//!     let pipeline = IngestPipeline::new(store, bridge);
//!
//!     let record = RawRecord::from_json(r#"{"hook_event_name": "Stop"}"#);
//!     let ack = pipeline.ingest(&record);
//!     println!("{}", serde_json::to_string(&ack)?);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! hook stdin ──► RawRecord ──► classify ──► SqliteEventStore
//!                                  │               ▲
//!                                  ▼               │ tail poll
//!                         NotificationBridge ──► SSE stream merge
//! ```

pub mod bridge;
pub mod classify;
pub mod error;
pub mod ingest;
pub mod record;
pub mod storage;
pub mod transcript;

// Re-export key types for convenience
pub use bridge::{BridgeError, NotificationBridge, PendingNotification, QUEUE_DIR};
pub use classify::{Classification, EventCategory, normalize};
pub use error::CoreError;
pub use ingest::{Ack, IngestPipeline};
pub use record::RawRecord;
pub use storage::{
    Agent, AgentActivity, DB_FILE, Event, EventPage, EventQuery, EventStore, EventSummary,
    NewEvent, Session, SqliteEventStore, StatsSnapshot, StoreError,
};
pub use transcript::{EventDraft, reconstruct};
