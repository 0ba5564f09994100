//! Per-document page and stroke state
//!
//! The document is the single in-memory owner of committed strokes,
//! keyed by 1-based page index. Snapshots serialize the whole document's
//! strokes to JSON; restoring a corrupt snapshot falls back to an empty
//! stroke set rather than blocking the document, and is logged.

use std::collections::BTreeMap;

use crate::coords::PageDimensions;
use crate::store::Snapshot;
use crate::stroke::{PageIndex, PageStrokes, Stroke, StrokeId};

/// State for one page of the document
#[derive(Debug, Clone, Default)]
pub struct PageState {
    /// Native pixel dimensions at the reference scale, once known
    pub dimensions: Option<PageDimensions>,

    /// Whether the page's base raster is currently rendered
    pub rendered: bool,

    /// Committed strokes in insertion order
    pub strokes: PageStrokes,
}

/// All annotation state for one open document
#[derive(Debug)]
pub struct Document {
    page_count: u32,
    pages: BTreeMap<PageIndex, PageState>,
}

impl Document {
    pub fn new(page_count: u32) -> Self {
        Self { page_count, pages: BTreeMap::new() }
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    fn in_range(&self, index: PageIndex) -> bool {
        index >= 1 && index <= self.page_count
    }

    pub fn page(&self, index: PageIndex) -> Option<&PageState> {
        self.pages.get(&index)
    }

    /// Page state, created lazily for any in-range index
    pub fn page_mut(&mut self, index: PageIndex) -> Option<&mut PageState> {
        if !self.in_range(index) {
            return None;
        }
        Some(self.pages.entry(index).or_default())
    }

    pub fn set_page_dimensions(&mut self, index: PageIndex, dims: PageDimensions) {
        if let Some(page) = self.page_mut(index) {
            page.dimensions = Some(dims);
        }
    }

    /// Strokes for a page in insertion order (empty for untouched pages)
    pub fn strokes(&self, index: PageIndex) -> &[Stroke] {
        static EMPTY: [Stroke; 0] = [];
        self.pages.get(&index).map(|p| p.strokes.as_slice()).unwrap_or(&EMPTY)
    }

    /// Append a committed stroke to its page. Out-of-range pages are
    /// dropped silently; a broken stroke must not break subsequent input.
    pub fn push_stroke(&mut self, stroke: Stroke) {
        let index = stroke.page_index;
        match self.page_mut(index) {
            Some(page) => page.strokes.push(stroke),
            None => log::debug!("dropping stroke for out-of-range page {index}"),
        }
    }

    /// Remove strokes by id from a page
    pub fn remove_strokes(&mut self, index: PageIndex, ids: &[StrokeId]) {
        if let Some(page) = self.pages.get_mut(&index) {
            page.strokes.remove_ids(ids);
        }
    }

    /// Serialize all strokes across the document, in page order then
    /// insertion order, as an opaque history snapshot.
    pub fn snapshot(&self) -> Snapshot {
        let all: Vec<&Stroke> = self.pages.values().flat_map(|p| p.strokes.iter()).collect();
        match serde_json::to_string(&all) {
            Ok(json) => Snapshot::new(json),
            Err(err) => {
                log::error!("failed to serialize stroke snapshot: {err}");
                Snapshot::new("[]")
            }
        }
    }

    /// Replace all stroke state from a snapshot.
    ///
    /// A malformed snapshot restores to an empty stroke set instead of
    /// failing; page dimensions and rendered flags are untouched either
    /// way.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        let strokes: Vec<Stroke> = match serde_json::from_str(snapshot.as_str()) {
            Ok(strokes) => strokes,
            Err(err) => {
                log::error!("corrupt stroke snapshot, restoring empty state: {err}");
                Vec::new()
            }
        };

        for page in self.pages.values_mut() {
            page.strokes.clear();
        }
        for stroke in strokes {
            self.push_stroke(stroke);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{Color, NormPoint};
    use crate::tool::Tool;

    fn two_point_stroke(page: PageIndex) -> Stroke {
        Stroke::new(
            page,
            vec![NormPoint::new(0.1, 0.1), NormPoint::new(0.5, 0.5)],
            Tool::pen(Color::RED),
            3.0,
        )
    }

    #[test]
    fn test_push_stroke_respects_page_range() {
        let mut doc = Document::new(3);
        doc.push_stroke(two_point_stroke(2));
        doc.push_stroke(two_point_stroke(0)); // out of range, 1-based
        doc.push_stroke(two_point_stroke(4)); // out of range

        assert_eq!(doc.strokes(2).len(), 1);
        assert!(doc.strokes(1).is_empty());
        assert!(doc.page(4).is_none());
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut doc = Document::new(3);
        doc.push_stroke(two_point_stroke(1));
        doc.push_stroke(two_point_stroke(3));
        let snapshot = doc.snapshot();

        let mut other = Document::new(3);
        other.restore(&snapshot);
        assert_eq!(other.strokes(1), doc.strokes(1));
        assert_eq!(other.strokes(3), doc.strokes(3));
        assert_eq!(other.snapshot(), snapshot);
    }

    #[test]
    fn test_restore_replaces_existing_state() {
        let mut doc = Document::new(2);
        doc.push_stroke(two_point_stroke(1));
        let with_one = doc.snapshot();

        doc.push_stroke(two_point_stroke(1));
        assert_eq!(doc.strokes(1).len(), 2);

        doc.restore(&with_one);
        assert_eq!(doc.strokes(1).len(), 1);
    }

    #[test]
    fn test_corrupt_snapshot_falls_back_to_empty() {
        let mut doc = Document::new(2);
        doc.push_stroke(two_point_stroke(1));

        doc.restore(&Snapshot::new("{not json"));
        assert!(doc.strokes(1).is_empty());
    }

    #[test]
    fn test_dimensions_survive_restore() {
        let mut doc = Document::new(1);
        doc.set_page_dimensions(1, PageDimensions::new(800.0, 1000.0));
        doc.restore(&Snapshot::new("[]"));
        assert!(doc.page(1).unwrap().dimensions.is_some());
    }
}
