//! Persistence for ink annotations.
//!
//! Owns the record format, the remote store contract, the debounced
//! autosaver, and the durable offline queue that catches saves made
//! without connectivity.

pub mod autosave;
pub mod queue;
pub mod record;
pub mod remote;

use thiserror::Error;

/// Local persistence failures (the remote side reports through
/// [`remote::RemoteError`]).
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("no platform data directory available")]
    NoProjectDirs,
}

pub use autosave::{AutosaveConfig, Autosaver, FlushReport};
pub use queue::{DrainReport, OfflineQueue, QueuedSave};
pub use record::{read_record_json, write_record_json, AnnotationRecord};
pub use remote::{load_page_strokes, RemoteError, RemoteStore, SavedRecord};
