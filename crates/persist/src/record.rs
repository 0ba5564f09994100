//! Annotation records and their on-disk JSON form.
//!
//! A record is the unit of persistence: the full stroke set for one
//! (owner, subject, page) triple, serialized as JSON, plus optional
//! flattened image bytes for consumers that cannot replay strokes.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use inklayer_core::{PageIndex, Stroke, Tool};

use crate::PersistError;

/// Seconds since the Unix epoch. Callers treat 0 as "unknown".
pub fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// One page's worth of annotations for one owner and subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotationRecord {
    /// Identity of the annotating user.
    pub owner_id: String,

    /// Identity of the annotated document.
    pub subject_id: String,

    /// Page the strokes belong to (1-based).
    pub page_index: PageIndex,

    /// Tool active when the record was produced.
    pub tool: Tool,

    /// JSON-encoded array of strokes.
    pub payload: String,

    /// Optional PNG of the page with ink flattened in. Opaque bytes;
    /// this crate never decodes them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flattened_png: Option<Vec<u8>>,

    /// Unix timestamps maintained by whoever last wrote the record.
    pub created_at: u64,
    pub updated_at: u64,
}

impl AnnotationRecord {
    /// Builds a record from in-memory strokes, stamping both timestamps
    /// with the current time.
    pub fn from_strokes(
        owner_id: impl Into<String>,
        subject_id: impl Into<String>,
        page_index: PageIndex,
        tool: Tool,
        strokes: &[Stroke],
    ) -> Result<Self, PersistError> {
        let payload = serde_json::to_string(strokes)?;
        let now = now_epoch_secs();
        Ok(Self {
            owner_id: owner_id.into(),
            subject_id: subject_id.into(),
            page_index,
            tool,
            payload,
            flattened_png: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Attaches flattened image bytes to the record.
    pub fn with_flattened_png(mut self, bytes: Vec<u8>) -> Self {
        self.flattened_png = Some(bytes);
        self
    }

    /// Decodes the stroke payload.
    ///
    /// A corrupt payload yields an empty stroke set rather than an
    /// error, so one bad record never blocks loading a document.
    pub fn decode_strokes(&self) -> Vec<Stroke> {
        match serde_json::from_str(&self.payload) {
            Ok(strokes) => strokes,
            Err(err) => {
                log::error!(
                    "discarding corrupt stroke payload for subject {} page {}: {}",
                    self.subject_id,
                    self.page_index,
                    err
                );
                Vec::new()
            }
        }
    }

    /// Key identifying which saved record this one supersedes.
    pub fn slot_key(&self) -> (String, PageIndex) {
        (self.subject_id.clone(), self.page_index)
    }
}

/// Writes a record as JSON using a temp file and rename, so readers
/// never observe a partially written file.
pub fn write_record_json(path: &Path, record: &AnnotationRecord) -> Result<(), PersistError> {
    let json = serde_json::to_string_pretty(record)?;
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, json)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Reads a record back from JSON. Missing or corrupt files return
/// `None`; corruption is logged.
pub fn read_record_json(path: &Path) -> Option<AnnotationRecord> {
    let json = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&json) {
        Ok(record) => Some(record),
        Err(err) => {
            log::error!("ignoring corrupt record file {}: {}", path.display(), err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inklayer_core::{Color, NormPoint};

    fn sample_strokes() -> Vec<Stroke> {
        vec![Stroke::new(
            2,
            vec![NormPoint::new(0.1, 0.1), NormPoint::new(0.4, 0.2)],
            Tool::Pen { color: Color::RED },
            3.0,
        )]
    }

    #[test]
    fn test_payload_round_trip() {
        let strokes = sample_strokes();
        let record =
            AnnotationRecord::from_strokes("user-1", "doc-1", 2, Tool::pen(Color::BLACK), &strokes).unwrap();
        assert_eq!(record.decode_strokes(), strokes);
    }

    #[test]
    fn test_corrupt_payload_decodes_to_empty() {
        let mut record =
            AnnotationRecord::from_strokes("user-1", "doc-1", 1, Tool::pen(Color::BLACK), &[]).unwrap();
        record.payload = "{not json".to_string();
        assert!(record.decode_strokes().is_empty());
    }

    #[test]
    fn test_record_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        let record =
            AnnotationRecord::from_strokes("user-1", "doc-1", 3, Tool::Highlighter, &sample_strokes())
                .unwrap();
        write_record_json(&path, &record).unwrap();
        assert_eq!(read_record_json(&path), Some(record));
    }

    #[test]
    fn test_corrupt_record_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        std::fs::write(&path, "garbage").unwrap();
        assert!(read_record_json(&path).is_none());
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        let record = AnnotationRecord::from_strokes("u", "d", 1, Tool::pen(Color::BLACK), &[]).unwrap();
        write_record_json(&path, &record).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_flattened_bytes_survive_serialization() {
        let record = AnnotationRecord::from_strokes("u", "d", 1, Tool::pen(Color::BLACK), &[])
            .unwrap()
            .with_flattened_png(vec![1, 2, 3]);
        let json = serde_json::to_string(&record).unwrap();
        let back: AnnotationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.flattened_png, Some(vec![1, 2, 3]));
    }
}
