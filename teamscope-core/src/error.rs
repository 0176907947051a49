//! Error types for teamscope-core

use thiserror::Error;

use crate::bridge::BridgeError;
use crate::storage::StoreError;

/// Top-level error aggregating the crate's subsystems.
///
/// The ingest path never surfaces this to hook callers; it exists for
/// library consumers that compose the store and bridge directly.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}
