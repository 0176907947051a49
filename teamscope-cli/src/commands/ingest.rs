//! Teamscope ingest command, the hook-side entry point
//!
//! Adapters pipe one raw hook record in as JSON and read the `{}` ack
//! back from stdout. The command always acks and exits zero; problems
//! are logged to stderr.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use teamscope_core::{
    Ack, DB_FILE, IngestPipeline, NotificationBridge, QUEUE_DIR, RawRecord, SqliteEventStore,
};

/// Arguments for the ingest command
#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Directory holding the event database and notification queue
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

/// Run the ingest command
pub fn run(args: IngestArgs) -> Result<()> {
    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        tracing::warn!("Failed to read hook input: {}", e);
    }

    let ack = ingest_input(&args, &input);
    println!("{}", ack_json(&ack));
    Ok(())
}

fn ingest_input(args: &IngestArgs, input: &str) -> Ack {
    let record = RawRecord::from_json(input);
    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(teamscope_paths::data_dir);

    match SqliteEventStore::open(data_dir.join(DB_FILE)) {
        Ok(store) => {
            let bridge = NotificationBridge::new(data_dir.join(QUEUE_DIR));
            IngestPipeline::new(Arc::new(store), bridge).ingest(&record)
        }
        Err(e) => {
            tracing::warn!("Failed to open event store: {}", e);
            Ack::default()
        }
    }
}

fn ack_json(ack: &Ack) -> String {
    serde_json::to_string(ack).unwrap_or_else(|_| "{}".to_string())
}
