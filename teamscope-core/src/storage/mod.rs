//! Durable event storage with SQLite.
//!
//! One events table is the source of truth; agents and sessions are
//! rollups updated transactionally with each insert, so aggregate
//! queries never scan the log.

mod error;
mod migrations;
mod query;
mod store;
mod types;

pub use error::StoreError;
pub use query::{DEFAULT_PAGE_SIZE, EventPage, EventQuery};
pub use store::{DB_FILE, EventStore, SqliteEventStore};
pub use types::{Agent, AgentActivity, Event, EventSummary, NewEvent, Session, StatsSnapshot};
