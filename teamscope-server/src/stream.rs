//! Live event stream: the notification queue merged with a store tail-poll.
//!
//! Each connected client runs its own [`StreamMerger`] loop. A cycle drains
//! the shared queue first, then tail-polls the store for anything the queue
//! did not deliver (another client may have drained it, or a publish may
//! have failed after insert). A per-client cursor advances past every
//! emitted id, so the frames a client sees carry strictly increasing ids.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::response::Sse;
use axum::response::sse::Event as SseEvent;
use serde::Serialize;
use teamscope_core::{EventStore, EventSummary, NotificationBridge, PendingNotification};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};

use crate::AppState;

/// Pacing for per-client stream loops.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Delay between merge cycles
    pub poll_interval: Duration,
    /// Minimum gap between heartbeat comments
    pub heartbeat_interval: Duration,
    /// How many recent events each tail-poll inspects
    pub tail_page_size: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            heartbeat_interval: Duration::from_secs(15),
            tail_page_size: 20,
        }
    }
}

/// One frame of the merged stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// Fresh event taken from the notification queue
    Notification(PendingNotification),
    /// Event recovered by the store tail-poll
    Event(EventSummary),
    /// Liveness marker, sent as an SSE comment
    Heartbeat,
}

impl StreamFrame {
    /// JSON body for data frames; heartbeats have none.
    pub fn data_json(&self) -> Option<String> {
        match self {
            StreamFrame::Notification(note) => Some(encode(note)),
            StreamFrame::Event(event) => Some(encode(event)),
            StreamFrame::Heartbeat => None,
        }
    }

    fn into_sse(self) -> SseEvent {
        match self.data_json() {
            Some(json) => SseEvent::default().data(json),
            None => SseEvent::default().comment("heartbeat"),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// Per-client merge loop over the shared queue and the store
pub struct StreamMerger {
    store: Arc<dyn EventStore>,
    bridge: Arc<NotificationBridge>,
    config: StreamConfig,
    last_id: i64,
    last_heartbeat: Instant,
}

impl StreamMerger {
    pub fn new(
        store: Arc<dyn EventStore>,
        bridge: Arc<NotificationBridge>,
        config: StreamConfig,
    ) -> Self {
        Self {
            store,
            bridge,
            config,
            last_id: 0,
            last_heartbeat: Instant::now(),
        }
    }

    /// One merge cycle: queue first, then the tail-poll, then a heartbeat
    /// when one is due.
    pub fn cycle(&mut self) -> Vec<StreamFrame> {
        let mut frames = Vec::new();

        for note in self.bridge.drain_pending() {
            // The queue is at-least-once; drop anything at or below the cursor.
            if note.id <= self.last_id {
                continue;
            }
            self.last_id = note.id;
            frames.push(StreamFrame::Notification(note));
        }

        // No tail-poll until a notification has anchored the cursor; a
        // fresh client must not be handed history the feed endpoint owns.
        if self.last_id > 0 {
            match self.store.recent(self.config.tail_page_size) {
                Ok(recent) => {
                    for event in recent.into_iter().rev() {
                        if event.id > self.last_id {
                            self.last_id = event.id;
                            frames.push(StreamFrame::Event(event));
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Stream tail-poll failed: {}", e);
                }
            }
        }

        if self.last_heartbeat.elapsed() >= self.config.heartbeat_interval {
            self.last_heartbeat = Instant::now();
            frames.push(StreamFrame::Heartbeat);
        }

        frames
    }

    /// Drive cycles until the client goes away.
    pub async fn run(mut self, tx: mpsc::Sender<StreamFrame>) {
        loop {
            for frame in self.cycle() {
                if tx.send(frame).await.is_err() {
                    // Client disconnected
                    return;
                }
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

/// GET /api/stream - merged live event stream over SSE
pub async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let merger = StreamMerger::new(
        Arc::clone(&state.store),
        Arc::clone(&state.bridge),
        state.stream.clone(),
    );
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(merger.run(tx));

    // Heartbeats come from the merger loop, not axum's keep-alive.
    Sse::new(ReceiverStream::new(rx).map(|frame| Ok(frame.into_sse())))
}
