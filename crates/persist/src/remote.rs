//! Remote annotation store contract.
//!
//! The engine persists through this trait rather than a concrete
//! backend, so tests and offline replay drive the same code path a
//! network-backed implementation would.

use thiserror::Error;
use uuid::Uuid;

use inklayer_core::PageIndex;

use crate::record::AnnotationRecord;

/// Failure modes a remote save or load can report.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// No connectivity. The caller should queue the work and retry.
    #[error("remote store unreachable")]
    Offline,

    /// The backend answered but rejected or failed the request.
    #[error("remote store error: {0}")]
    Server(String),
}

/// Receipt for a stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRecord {
    /// Server-assigned identity of the stored row.
    pub record_id: Uuid,

    /// Unix timestamp of the write.
    pub updated_at: u64,
}

/// Backend that stores one record per (owner, subject, page).
///
/// Saves are upserts: saving the same slot twice keeps only the latest
/// payload, which makes queued retries idempotent.
pub trait RemoteStore {
    /// Stores or replaces the record for its slot.
    fn save(&self, record: &AnnotationRecord) -> Result<SavedRecord, RemoteError>;

    /// Fetches the most recent record for a slot, if any.
    fn load_latest(
        &self,
        owner_id: &str,
        subject_id: &str,
        page_index: PageIndex,
    ) -> Result<Option<AnnotationRecord>, RemoteError>;

    /// Lists every stored record for a subject across all of its pages,
    /// newest first. Audit view over past saves.
    fn list_history(&self, subject_id: &str) -> Result<Vec<AnnotationRecord>, RemoteError>;
}

/// Fetches and decodes the stroke set for one page.
///
/// A missing record, an unreachable store, or a corrupt payload all
/// resolve to an empty stroke set so document opening never fails on
/// annotation state. Store failures are logged.
pub fn load_page_strokes(
    store: &dyn RemoteStore,
    owner_id: &str,
    subject_id: &str,
    page_index: PageIndex,
) -> Vec<inklayer_core::Stroke> {
    match store.load_latest(owner_id, subject_id, page_index) {
        Ok(Some(record)) => record.decode_strokes(),
        Ok(None) => Vec::new(),
        Err(err) => {
            log::warn!(
                "could not load annotations for subject {} page {}: {}",
                subject_id,
                page_index,
                err
            );
            Vec::new()
        }
    }
}
