//! Debounced background autosave.
//!
//! Commits mark a (subject, page) slot dirty; a background thread
//! batches the marks and pushes the latest record per slot to the
//! remote store once the debounce window closes. Saves that fail land
//! in the durable offline queue instead of being dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use inklayer_core::PageIndex;

use crate::queue::{DrainReport, OfflineQueue};
use crate::record::AnnotationRecord;
use crate::remote::RemoteStore;

/// Timing and threading knobs for the autosaver.
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    /// Quiet period after the last change before a save fires.
    pub debounce: Duration,

    /// Ceiling on how long continuous changes can postpone a save.
    pub max_debounce: Duration,

    /// Whether to run the background save thread. When false only
    /// explicit [`Autosaver::flush`] calls persist anything.
    pub enable_background: bool,

    /// Poll interval of the background thread.
    pub check_interval: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(10),
            max_debounce: Duration::from_secs(30),
            enable_background: true,
            check_interval: Duration::from_millis(500),
        }
    }
}

/// Dirty-state tracking shared with the background thread.
#[derive(Debug)]
struct PendingSave {
    first_marked_at: Instant,
    last_marked_at: Instant,
    is_dirty: bool,
}

impl PendingSave {
    fn new() -> Self {
        Self {
            first_marked_at: Instant::now(),
            last_marked_at: Instant::now(),
            is_dirty: false,
        }
    }

    fn mark_dirty(&mut self) {
        let now = Instant::now();
        if !self.is_dirty {
            self.first_marked_at = now;
        }
        self.last_marked_at = now;
        self.is_dirty = true;
    }

    fn clear(&mut self) {
        self.is_dirty = false;
    }

    fn should_write(&self, config: &AutosaveConfig) -> bool {
        if !self.is_dirty {
            return false;
        }
        self.last_marked_at.elapsed() >= config.debounce
            || self.first_marked_at.elapsed() >= config.max_debounce
    }
}

/// Outcome of pushing the pending records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushReport {
    /// Records the store accepted.
    pub saved: usize,

    /// Records diverted to the offline queue after a failed save.
    pub queued: usize,
}

type SlotKey = (String, PageIndex);

/// Debounced writer that batches annotation saves.
///
/// Holds the latest record per (subject, page) slot; rapid successive
/// commits to the same slot coalesce into one save.
pub struct Autosaver {
    config: AutosaveConfig,
    pending: Arc<Mutex<PendingSave>>,
    records: Arc<Mutex<HashMap<SlotKey, AnnotationRecord>>>,
    store: Arc<dyn RemoteStore + Send + Sync>,
    queue: Arc<Mutex<OfflineQueue>>,
    _thread_handle: Option<thread::JoinHandle<()>>,
    should_stop: Arc<Mutex<bool>>,
}

impl Autosaver {
    /// Creates an autosaver with default timing.
    pub fn new(store: Arc<dyn RemoteStore + Send + Sync>, queue: OfflineQueue) -> Self {
        Self::with_config(store, queue, AutosaveConfig::default())
    }

    /// Creates an autosaver with custom timing.
    pub fn with_config(
        store: Arc<dyn RemoteStore + Send + Sync>,
        queue: OfflineQueue,
        config: AutosaveConfig,
    ) -> Self {
        let pending = Arc::new(Mutex::new(PendingSave::new()));
        let records = Arc::new(Mutex::new(HashMap::new()));
        let queue = Arc::new(Mutex::new(queue));
        let should_stop = Arc::new(Mutex::new(false));

        let thread_handle = if config.enable_background {
            Some(Self::spawn_background_thread(
                Arc::clone(&pending),
                Arc::clone(&records),
                Arc::clone(&store),
                Arc::clone(&queue),
                Arc::clone(&should_stop),
                config.clone(),
            ))
        } else {
            None
        };

        Self {
            config,
            pending,
            records,
            store,
            queue,
            _thread_handle: thread_handle,
            should_stop,
        }
    }

    /// Registers a record for saving, replacing any pending record for
    /// the same slot, and restarts the debounce window.
    pub fn mark_dirty(&self, record: AnnotationRecord) {
        let key = record.slot_key();
        self.records.lock().unwrap().insert(key, record);
        self.pending.lock().unwrap().mark_dirty();
    }

    /// True while changes await persistence.
    pub fn is_dirty(&self) -> bool {
        self.pending.lock().unwrap().is_dirty
    }

    /// Saves all pending records immediately, bypassing the debounce.
    /// Used on shutdown and for explicit save actions.
    pub fn flush(&self) -> FlushReport {
        let mut pending = self.pending.lock().unwrap();
        if !pending.is_dirty {
            return FlushReport::default();
        }
        let report = Self::save_pending(&self.records, self.store.as_ref(), &self.queue);
        pending.clear();
        report
    }

    /// True when the offline queue holds failed saves. Drives the
    /// "working offline" indicator.
    pub fn is_offline_pending(&self) -> bool {
        !self.queue.lock().unwrap().is_empty()
    }

    /// Retries queued saves against the store.
    pub fn drain_offline(&self) -> DrainReport {
        self.queue.lock().unwrap().drain(self.store.as_ref())
    }

    /// Current timing configuration.
    pub fn config(&self) -> &AutosaveConfig {
        &self.config
    }

    fn save_pending(
        records: &Arc<Mutex<HashMap<SlotKey, AnnotationRecord>>>,
        store: &dyn RemoteStore,
        queue: &Arc<Mutex<OfflineQueue>>,
    ) -> FlushReport {
        let batch: Vec<AnnotationRecord> = records.lock().unwrap().drain().map(|(_, r)| r).collect();
        let mut report = FlushReport::default();
        for record in batch {
            match store.save(&record) {
                Ok(_) => report.saved += 1,
                Err(err) => {
                    log::warn!(
                        "save failed for subject {} page {}, queuing offline: {}",
                        record.subject_id,
                        record.page_index,
                        err
                    );
                    match queue.lock().unwrap().enqueue(record) {
                        Ok(_) => report.queued += 1,
                        Err(enqueue_err) => {
                            log::error!("offline enqueue failed, save lost: {}", enqueue_err);
                        }
                    }
                }
            }
        }
        report
    }

    fn spawn_background_thread(
        pending: Arc<Mutex<PendingSave>>,
        records: Arc<Mutex<HashMap<SlotKey, AnnotationRecord>>>,
        store: Arc<dyn RemoteStore + Send + Sync>,
        queue: Arc<Mutex<OfflineQueue>>,
        should_stop: Arc<Mutex<bool>>,
        config: AutosaveConfig,
    ) -> thread::JoinHandle<()> {
        thread::spawn(move || loop {
            if *should_stop.lock().unwrap() {
                break;
            }

            let should_write = pending.lock().unwrap().should_write(&config);
            if should_write {
                let mut pending = pending.lock().unwrap();
                if pending.is_dirty {
                    Self::save_pending(&records, store.as_ref(), &queue);
                    pending.clear();
                }
            }

            thread::sleep(config.check_interval);
        })
    }
}

impl Drop for Autosaver {
    fn drop(&mut self) {
        *self.should_stop.lock().unwrap() = true;
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::now_epoch_secs;
    use crate::remote::{RemoteError, SavedRecord};
    use inklayer_core::{Color, Tool};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct MockStore {
        saves: Mutex<Vec<AnnotationRecord>>,
        offline: AtomicBool,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                saves: Mutex::new(Vec::new()),
                offline: AtomicBool::new(false),
            }
        }

        fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }

        fn save_count(&self) -> usize {
            self.saves.lock().unwrap().len()
        }
    }

    impl RemoteStore for MockStore {
        fn save(&self, record: &AnnotationRecord) -> Result<SavedRecord, RemoteError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(RemoteError::Offline);
            }
            self.saves.lock().unwrap().push(record.clone());
            Ok(SavedRecord {
                record_id: uuid::Uuid::new_v4(),
                updated_at: now_epoch_secs(),
            })
        }

        fn load_latest(
            &self,
            _owner_id: &str,
            _subject_id: &str,
            _page_index: u32,
        ) -> Result<Option<AnnotationRecord>, RemoteError> {
            Ok(None)
        }

        fn list_history(&self, _subject_id: &str) -> Result<Vec<AnnotationRecord>, RemoteError> {
            Ok(Vec::new())
        }
    }

    fn record(page: u32) -> AnnotationRecord {
        AnnotationRecord::from_strokes("user-1", "doc-1", page, Tool::pen(Color::BLACK), &[]).unwrap()
    }

    fn manual_autosaver(store: Arc<MockStore>, root: &std::path::Path) -> Autosaver {
        Autosaver::with_config(
            store,
            OfflineQueue::with_root(root).unwrap(),
            AutosaveConfig {
                enable_background: false,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_flush_when_clean_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MockStore::new());
        let autosaver = manual_autosaver(Arc::clone(&store), dir.path());
        assert_eq!(autosaver.flush(), FlushReport::default());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_flush_bypasses_debounce() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MockStore::new());
        let autosaver = manual_autosaver(Arc::clone(&store), dir.path());

        autosaver.mark_dirty(record(1));
        assert!(autosaver.is_dirty());

        let report = autosaver.flush();
        assert_eq!(report, FlushReport { saved: 1, queued: 0 });
        assert!(!autosaver.is_dirty());
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_rapid_commits_coalesce_into_one_save_per_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MockStore::new());
        let autosaver = manual_autosaver(Arc::clone(&store), dir.path());

        for _ in 0..10 {
            autosaver.mark_dirty(record(1));
        }
        let report = autosaver.flush();
        assert_eq!(report.saved, 1);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_distinct_pages_each_get_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MockStore::new());
        let autosaver = manual_autosaver(Arc::clone(&store), dir.path());

        autosaver.mark_dirty(record(1));
        autosaver.mark_dirty(record(2));
        assert_eq!(autosaver.flush().saved, 2);
    }

    #[test]
    fn test_background_save_fires_after_debounce() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MockStore::new());
        let autosaver = Autosaver::with_config(
            Arc::clone(&store) as Arc<dyn RemoteStore + Send + Sync>,
            OfflineQueue::with_root(dir.path()).unwrap(),
            AutosaveConfig {
                debounce: Duration::from_millis(100),
                max_debounce: Duration::from_millis(1000),
                enable_background: true,
                check_interval: Duration::from_millis(25),
            },
        );

        for _ in 0..10 {
            autosaver.mark_dirty(record(1));
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(400));

        assert!(!autosaver.is_dirty());
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_max_debounce_forces_save_despite_continuous_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MockStore::new());
        let autosaver = Autosaver::with_config(
            Arc::clone(&store) as Arc<dyn RemoteStore + Send + Sync>,
            OfflineQueue::with_root(dir.path()).unwrap(),
            AutosaveConfig {
                debounce: Duration::from_secs(60),
                max_debounce: Duration::from_millis(150),
                enable_background: true,
                check_interval: Duration::from_millis(25),
            },
        );

        // Keep resetting the quiet-period clock past the ceiling.
        for _ in 0..20 {
            autosaver.mark_dirty(record(1));
            thread::sleep(Duration::from_millis(20));
        }
        thread::sleep(Duration::from_millis(200));

        assert!(store.save_count() >= 1);
    }

    #[test]
    fn test_failed_save_lands_in_offline_queue() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MockStore::new());
        store.set_offline(true);
        let autosaver = manual_autosaver(Arc::clone(&store), dir.path());

        autosaver.mark_dirty(record(1));
        let report = autosaver.flush();
        assert_eq!(report, FlushReport { saved: 0, queued: 1 });
        assert!(autosaver.is_offline_pending());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_drain_offline_after_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MockStore::new());
        store.set_offline(true);
        let autosaver = manual_autosaver(Arc::clone(&store), dir.path());

        autosaver.mark_dirty(record(1));
        autosaver.flush();
        assert!(autosaver.is_offline_pending());

        store.set_offline(false);
        let report = autosaver.drain_offline();
        assert_eq!(report.sent, 1);
        assert_eq!(report.remaining, 0);
        assert!(!autosaver.is_offline_pending());
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_drop_flushes_pending_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MockStore::new());
        {
            let autosaver = manual_autosaver(Arc::clone(&store), dir.path());
            autosaver.mark_dirty(record(1));
        }
        assert_eq!(store.save_count(), 1);
    }
}
