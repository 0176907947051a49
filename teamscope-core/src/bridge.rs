//! Durable notification handoff between ingestion and live streams.
//!
//! Hook processes and the server are separate processes, so fresh-event
//! notifications go through the filesystem: each publish writes one small
//! JSON file into a queue directory, and each drain consumes the whole
//! directory in name order, deleting what it took. File names are derived
//! from the entry's own timestamp and id, zero-padded, so a lexicographic
//! listing reproduces creation order no matter when the queue is read.
//!
//! Delivery is at-least-once. Entries that fail to decode are deleted
//! without being returned so one corrupt file can never wedge a stream.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::EventCategory;
use crate::storage::NewEvent;

/// Directory name of the queue inside a data directory.
pub const QUEUE_DIR: &str = "pending";

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The slice of a stored event that live streams need immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingNotification {
    pub id: i64,
    pub category: EventCategory,
    pub summary: String,
    pub agent_name: String,
    pub timestamp: DateTime<Utc>,
    pub tool_name: String,
}

impl PendingNotification {
    /// Project a freshly stored event into its notification form.
    pub fn from_new_event(id: i64, event: &NewEvent) -> Self {
        Self {
            id,
            category: event.category,
            summary: event.summary.clone(),
            agent_name: event.agent_name.clone(),
            timestamp: event.timestamp,
            tool_name: event.tool_name.clone(),
        }
    }

    fn file_name(&self) -> String {
        format!(
            "{:013}_{:010}.json",
            self.timestamp.timestamp_millis(),
            self.id
        )
    }
}

/// File-per-entry queue on the local filesystem.
pub struct NotificationBridge {
    queue_dir: PathBuf,
}

impl NotificationBridge {
    pub fn new(queue_dir: impl Into<PathBuf>) -> Self {
        Self {
            queue_dir: queue_dir.into(),
        }
    }

    pub fn queue_dir(&self) -> &Path {
        &self.queue_dir
    }

    /// Write one notification into the queue, creating the directory on
    /// first use.
    pub fn publish(&self, note: &PendingNotification) -> Result<(), BridgeError> {
        fs::create_dir_all(&self.queue_dir)?;
        let path = self.queue_dir.join(note.file_name());
        fs::write(&path, serde_json::to_string(note)?)?;
        Ok(())
    }

    /// Take every pending notification, oldest first, deleting entries as
    /// they are consumed. A missing queue directory reads as empty.
    pub fn drain_pending(&self) -> Vec<PendingNotification> {
        let entries = match fs::read_dir(&self.queue_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut notes = Vec::new();
        for path in paths {
            match read_note(&path) {
                Ok(note) => {
                    notes.push(note);
                    remove_entry(&path);
                }
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "dropping undecodable queue entry"
                    );
                    remove_entry(&path);
                }
            }
        }
        notes
    }
}

fn read_note(path: &Path) -> Result<PendingNotification, BridgeError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn remove_entry(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        tracing::warn!(
            path = %path.display(),
            error = %err,
            "failed to remove queue entry"
        );
    }
}
