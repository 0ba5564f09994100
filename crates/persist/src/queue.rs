//! Durable offline save queue.
//!
//! When a save fails, its record lands here as one JSON file per entry
//! under the queue's root directory. Entries survive process restarts
//! and drain in FIFO order once a store accepts them again.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::record::{now_epoch_secs, AnnotationRecord};
use crate::remote::RemoteStore;
use crate::PersistError;

/// Delay before the first retry of a failing entry. Doubles per attempt.
const BACKOFF_BASE: Duration = Duration::from_millis(250);

/// Retries per entry within one drain pass. An entry that still fails
/// stays queued for the next pass.
const MAX_ATTEMPTS_PER_PASS: u32 = 3;

/// One queued save, as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedSave {
    /// Monotonic position in the queue. Lower ids drain first.
    pub id: u64,

    /// Unix timestamp of enqueue.
    pub enqueued_at: u64,

    /// The record that failed to save.
    pub record: AnnotationRecord,
}

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Entries accepted by the store and removed from the queue.
    pub sent: usize,

    /// Entries still queued after the pass.
    pub remaining: usize,
}

/// File-backed FIFO of saves awaiting connectivity.
pub struct OfflineQueue {
    root: PathBuf,
    next_id: u64,
}

impl OfflineQueue {
    /// Opens (or creates) a queue rooted at the given directory,
    /// resuming id assignment after any entries already on disk.
    pub fn with_root(root: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let mut queue = Self { root, next_id: 1 };
        let max_id = queue.load_items()?.iter().map(|item| item.id).max();
        if let Some(max_id) = max_id {
            queue.next_id = max_id + 1;
        }
        Ok(queue)
    }

    /// Opens the queue in the platform data directory.
    pub fn from_default_project() -> Result<Self, PersistError> {
        let dirs = ProjectDirs::from("com", "inklayer", "inklayer")
            .ok_or(PersistError::NoProjectDirs)?;
        Self::with_root(dirs.data_dir().join("offline-queue"))
    }

    /// Directory holding the entry files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Appends a record to the queue. The entry file is written
    /// atomically so a crash mid-enqueue never leaves a corrupt entry.
    pub fn enqueue(&mut self, record: AnnotationRecord) -> Result<u64, PersistError> {
        let id = self.next_id;
        self.next_id += 1;
        let item = QueuedSave {
            id,
            enqueued_at: now_epoch_secs(),
            record,
        };
        let json = serde_json::to_string_pretty(&item)?;
        let path = self.item_path(id);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &path)?;
        Ok(id)
    }

    /// All queued entries in drain (FIFO) order. Corrupt entry files
    /// are logged and skipped.
    pub fn items(&self) -> Result<Vec<QueuedSave>, PersistError> {
        self.load_items()
    }

    /// Number of entries on disk. Errors count as an empty queue.
    pub fn len(&self) -> usize {
        self.load_items().map(|items| items.len()).unwrap_or(0)
    }

    /// True when no saves are waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attempts to send every queued entry to the store, oldest first.
    ///
    /// Each entry gets up to [`MAX_ATTEMPTS_PER_PASS`] tries with
    /// exponentially growing delays between them. Entries that still
    /// fail keep their place; later entries are still attempted because
    /// saves are per-slot upserts and cannot arrive out of order within
    /// a slot (the queue holds at most the failure history of distinct
    /// moments, oldest first).
    pub fn drain(&mut self, store: &dyn RemoteStore) -> DrainReport {
        self.drain_with_sleeper(store, &mut |delay| thread::sleep(delay))
    }

    /// Drain with an injectable delay function. Tests pass a recorder
    /// instead of sleeping.
    pub fn drain_with_sleeper(
        &mut self,
        store: &dyn RemoteStore,
        sleep: &mut dyn FnMut(Duration),
    ) -> DrainReport {
        let items = match self.load_items() {
            Ok(items) => items,
            Err(err) => {
                log::error!("offline queue unreadable: {}", err);
                return DrainReport {
                    sent: 0,
                    remaining: 0,
                };
            }
        };

        let mut sent = 0;
        let mut remaining = 0;
        for item in items {
            if self.send_with_backoff(store, &item, sleep) {
                if let Err(err) = fs::remove_file(self.item_path(item.id)) {
                    log::error!("failed to remove drained queue entry {}: {}", item.id, err);
                }
                sent += 1;
            } else {
                remaining += 1;
            }
        }
        DrainReport { sent, remaining }
    }

    fn send_with_backoff(
        &self,
        store: &dyn RemoteStore,
        item: &QueuedSave,
        sleep: &mut dyn FnMut(Duration),
    ) -> bool {
        let mut delay = BACKOFF_BASE;
        for attempt in 1..=MAX_ATTEMPTS_PER_PASS {
            match store.save(&item.record) {
                Ok(_) => return true,
                Err(err) => {
                    log::warn!(
                        "queued save {} attempt {}/{} failed: {}",
                        item.id,
                        attempt,
                        MAX_ATTEMPTS_PER_PASS,
                        err
                    );
                    if attempt < MAX_ATTEMPTS_PER_PASS {
                        sleep(delay);
                        delay *= 2;
                    }
                }
            }
        }
        false
    }

    fn item_path(&self, id: u64) -> PathBuf {
        self.root.join(format!("{:010}.json", id))
    }

    fn load_items(&self) -> Result<Vec<QueuedSave>, PersistError> {
        let mut items = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let json = fs::read_to_string(&path)?;
            match serde_json::from_str::<QueuedSave>(&json) {
                Ok(item) => items.push(item),
                Err(err) => {
                    log::error!("skipping corrupt queue entry {}: {}", path.display(), err);
                }
            }
        }
        items.sort_by_key(|item| item.id);
        Ok(items)
    }
}
