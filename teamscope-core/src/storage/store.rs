//! Event storage trait and SQLite implementation

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;

use super::error::StoreError;
use super::migrations::Migrator;
use super::query::{EventPage, EventQuery};
use super::types::{Agent, AgentActivity, Event, EventSummary, NewEvent, Session, StatsSnapshot};
use crate::classify::EventCategory;

/// File name of the event database inside a data directory.
pub const DB_FILE: &str = "teamscope.db";

/// Event storage trait
pub trait EventStore: Send + Sync {
    /// Insert one event and update the agent and session rollups in the
    /// same transaction. Returns the assigned id.
    fn insert(&self, event: &NewEvent) -> Result<i64, StoreError>;

    /// Page through events, newest first.
    fn query(&self, query: &EventQuery) -> Result<EventPage, StoreError>;

    /// Fetch one event with its payload.
    fn get_by_id(&self, id: i64) -> Result<Option<Event>, StoreError>;

    /// All agents, most recently active first.
    fn list_agents(&self) -> Result<Vec<Agent>, StoreError>;

    /// All sessions, most recently active first.
    fn list_sessions(&self) -> Result<Vec<Session>, StoreError>;

    /// The newest `limit` events; the stream tail-poll reads these.
    fn recent(&self, limit: u32) -> Result<Vec<EventSummary>, StoreError>;

    /// Dashboard aggregates.
    fn stats(&self) -> Result<StatsSnapshot, StoreError>;
}

/// SQLite-backed event store
pub struct SqliteEventStore {
    conn: Mutex<Connection>,
}

impl SqliteEventStore {
    /// Open or create the database at path, creating parent directories
    /// as needed.
    ///
    /// WAL mode plus a busy timeout let hook processes and the server
    /// write through separate connections to the same file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "journal_mode", "wal")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    /// Run migrations
    fn init(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let migrator = Migrator::new(&conn);
        migrator.migrate()
    }

    fn row_to_summary(row: &rusqlite::Row) -> Result<EventSummary, rusqlite::Error> {
        let ms: i64 = row.get(1)?;
        let category_str: String = row.get(7)?;
        Ok(EventSummary {
            id: row.get(0)?,
            timestamp: timestamp_from_ms(ms),
            session_id: row.get(2)?,
            team_name: row.get(3)?,
            agent_name: row.get(4)?,
            hook_event: row.get(5)?,
            tool_name: row.get(6)?,
            event_category: EventCategory::parse(&category_str)
                .unwrap_or(EventCategory::Lifecycle),
            summary: row.get(8)?,
        })
    }
}

impl EventStore for SqliteEventStore {
    fn insert(&self, event: &NewEvent) -> Result<i64, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let ts = event.timestamp.timestamp_millis();

        tx.execute(
            "INSERT INTO events (timestamp_ms, session_id, team_name, agent_name, hook_event, tool_name, event_category, summary, payload_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                ts,
                event.session_id,
                event.team_name,
                event.agent_name,
                event.hook_event,
                event.tool_name,
                event.category.as_str(),
                event.summary,
                event.payload_json,
            ],
        )?;
        let id = tx.last_insert_rowid();

        if !event.agent_name.is_empty() {
            tx.execute(
                "INSERT INTO agents (agent_name, team_name, first_seen_ms, last_seen_ms, event_count)
                 VALUES (?1, ?2, ?3, ?3, 1)
                 ON CONFLICT(agent_name) DO UPDATE SET
                    team_name = CASE WHEN excluded.team_name != '' THEN excluded.team_name ELSE agents.team_name END,
                    last_seen_ms = excluded.last_seen_ms,
                    event_count = agents.event_count + 1",
                rusqlite::params![event.agent_name, event.team_name, ts],
            )?;
        }

        if !event.session_id.is_empty() {
            tx.execute(
                "INSERT INTO sessions (session_id, team_name, started_at_ms, ended_at_ms, event_count)
                 VALUES (?1, ?2, ?3, ?3, 1)
                 ON CONFLICT(session_id) DO UPDATE SET
                    team_name = CASE WHEN excluded.team_name != '' THEN excluded.team_name ELSE sessions.team_name END,
                    ended_at_ms = excluded.ended_at_ms,
                    event_count = sessions.event_count + 1",
                rusqlite::params![event.session_id, event.team_name, ts],
            )?;
        }

        tx.commit()?;
        Ok(id)
    }

    fn query(&self, query: &EventQuery) -> Result<EventPage, StoreError> {
        let conn = self.conn.lock().unwrap();

        // Build WHERE clauses
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(category) = query.category {
            conditions.push(format!("event_category = ?{}", params.len() + 1));
            params.push(Box::new(category.as_str().to_string()));
        }

        if let Some(ref agent) = query.agent {
            conditions.push(format!("agent_name = ?{}", params.len() + 1));
            params.push(Box::new(agent.clone()));
        }

        if let Some(ref tool) = query.tool {
            conditions.push(format!("tool_name = ?{}", params.len() + 1));
            params.push(Box::new(tool.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        // Count query
        let count_sql = format!("SELECT COUNT(*) FROM events {}", where_clause);
        let total: i64 = {
            let mut stmt = conn.prepare(&count_sql)?;
            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params.iter().map(|p| p.as_ref()).collect();
            stmt.query_row(params_refs.as_slice(), |row| row.get(0))?
        };

        // Main query with pagination; ties on timestamp break by id so
        // the order is total.
        let select_sql = format!(
            "SELECT id, timestamp_ms, session_id, team_name, agent_name, hook_event, tool_name, event_category, summary
             FROM events {}
             ORDER BY timestamp_ms DESC, id DESC LIMIT ?{} OFFSET ?{}",
            where_clause,
            params.len() + 1,
            params.len() + 2
        );

        params.push(Box::new(query.page_size as i64));
        params.push(Box::new(query.offset() as i64));

        let events = {
            let mut stmt = conn.prepare(&select_sql)?;
            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params.iter().map(|p| p.as_ref()).collect();
            let rows = stmt.query_map(params_refs.as_slice(), |row| Self::row_to_summary(row))?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        Ok(EventPage {
            events,
            total,
            page: query.page,
            page_size: query.page_size,
            page_count: EventPage::page_count_for(total, query.page_size),
        })
    }

    fn get_by_id(&self, id: i64) -> Result<Option<Event>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, timestamp_ms, session_id, team_name, agent_name, hook_event, tool_name, event_category, summary, payload_json
             FROM events WHERE id = ?1",
        )?;

        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => {
                let ms: i64 = row.get(1)?;
                let category_str: String = row.get(7)?;
                Ok(Some(Event {
                    id: row.get(0)?,
                    timestamp: timestamp_from_ms(ms),
                    session_id: row.get(2)?,
                    team_name: row.get(3)?,
                    agent_name: row.get(4)?,
                    hook_event: row.get(5)?,
                    tool_name: row.get(6)?,
                    event_category: EventCategory::parse(&category_str)
                        .unwrap_or(EventCategory::Lifecycle),
                    summary: row.get(8)?,
                    payload_json: row.get(9)?,
                }))
            }
            None => Ok(None),
        }
    }

    fn list_agents(&self) -> Result<Vec<Agent>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT agent_name, team_name, first_seen_ms, last_seen_ms, event_count
             FROM agents ORDER BY last_seen_ms DESC, agent_name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Agent {
                agent_name: row.get(0)?,
                team_name: row.get(1)?,
                first_seen: timestamp_from_ms(row.get::<_, i64>(2)?),
                last_seen: timestamp_from_ms(row.get::<_, i64>(3)?),
                event_count: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT session_id, team_name, started_at_ms, ended_at_ms, event_count
             FROM sessions ORDER BY ended_at_ms DESC, session_id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Session {
                session_id: row.get(0)?,
                team_name: row.get(1)?,
                started_at: timestamp_from_ms(row.get::<_, i64>(2)?),
                ended_at: timestamp_from_ms(row.get::<_, i64>(3)?),
                event_count: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn recent(&self, limit: u32) -> Result<Vec<EventSummary>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, timestamp_ms, session_id, team_name, agent_name, hook_event, tool_name, event_category, summary
             FROM events ORDER BY timestamp_ms DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], |row| Self::row_to_summary(row))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn stats(&self) -> Result<StatsSnapshot, StoreError> {
        let conn = self.conn.lock().unwrap();

        let total_events: i64 =
            conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;

        let mut by_category = BTreeMap::new();
        {
            let mut stmt =
                conn.prepare("SELECT event_category, COUNT(*) FROM events GROUP BY event_category")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (category, count) = row?;
                by_category.insert(category, count);
            }
        }

        // Ties break alphabetically so the winner is stable.
        let most_active_agent = {
            let mut stmt = conn.prepare(
                "SELECT agent_name, event_count FROM agents
                 ORDER BY event_count DESC, agent_name ASC LIMIT 1",
            )?;
            let mut rows = stmt.query([])?;
            match rows.next()? {
                Some(row) => Some(AgentActivity {
                    agent_name: row.get(0)?,
                    event_count: row.get(1)?,
                }),
                None => None,
            }
        };

        let cutoff = (Utc::now() - Duration::minutes(1)).timestamp_millis();
        let events_last_minute: i64 = conn.query_row(
            "SELECT COUNT(*) FROM events WHERE timestamp_ms >= ?1",
            [cutoff],
            |row| row.get(0),
        )?;

        Ok(StatsSnapshot {
            total_events,
            by_category,
            most_active_agent,
            events_last_minute,
        })
    }
}

fn timestamp_from_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}
