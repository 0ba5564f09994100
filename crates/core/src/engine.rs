//! Annotation engine facade
//!
//! Wires the document, the tool/history store, the capture state machine
//! and the eraser behind a single pointer-event API. Drawing-path errors
//! never cross the pointer boundary: invalid gestures degrade to no-ops
//! so a broken stroke cannot break subsequent input.

use crate::capture::{FeedbackSegment, StrokeCapture};
use crate::coords;
use crate::document::Document;
use crate::eraser::{self, DEFAULT_ERASE_THRESHOLD};
use crate::store::{Snapshot, ToolHistoryStore};
use crate::stroke::{PageIndex, StrokeId};
use crate::tool::Tool;

/// What a pointer-down turned into
#[derive(Debug, Clone, PartialEq)]
pub enum PointerResponse {
    /// No active tool, page not ready, or otherwise nothing to do
    Ignored,
    /// A drawing capture started
    CaptureStarted,
    /// An erase gesture resolved; the listed strokes were removed and the
    /// page overlay must be redrawn
    Erased(Vec<StrokeId>),
}

/// Single entry point for the drawing side of the viewer
#[derive(Debug)]
pub struct AnnotationEngine {
    document: Document,
    store: ToolHistoryStore,
    capture: StrokeCapture,
    erase_threshold: f32,
}

impl AnnotationEngine {
    pub fn new(page_count: u32) -> Self {
        Self::from_document(Document::new(page_count))
    }

    /// Build an engine over pre-loaded state; history starts at the
    /// loaded snapshot so the first undo cannot reach past it.
    pub fn from_document(document: Document) -> Self {
        let store = ToolHistoryStore::new(document.snapshot());
        Self {
            document,
            store,
            capture: StrokeCapture::new(),
            erase_threshold: DEFAULT_ERASE_THRESHOLD,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn store(&self) -> &ToolHistoryStore {
        &self.store
    }

    /// Switch the active tool. An in-progress capture is committed first
    /// (with the tool it was started with), never discarded.
    pub fn set_tool(&mut self, tool: Option<Tool>) {
        if let Some(stroke) = self.capture.tool_switched() {
            self.commit(stroke);
        }
        self.store.set_active_tool(tool);
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.store.set_stroke_width(width);
    }

    /// Pointer-down on a page, in page-local screen pixels at the current
    /// zoom. Dispatches to capture or erase depending on the active tool.
    /// Pages whose dimensions are not yet known cannot accept input.
    pub fn pointer_down(
        &mut self,
        page_index: PageIndex,
        x: f32,
        y: f32,
        zoom_percent: u16,
    ) -> PointerResponse {
        let Some(dims) = self.document.page(page_index).and_then(|p| p.dimensions) else {
            return PointerResponse::Ignored;
        };

        match self.store.active_tool() {
            Some(Tool::Eraser) => {
                let point = coords::to_normalized(x, y, dims, zoom_percent);
                let threshold = self.erase_threshold;
                let Some(page) = self.document.page_mut(page_index) else {
                    return PointerResponse::Ignored;
                };
                let removed = eraser::erase_at(&mut page.strokes, point, threshold);
                if !removed.is_empty() {
                    let snapshot = self.document.snapshot();
                    self.store.push_snapshot(snapshot);
                }
                PointerResponse::Erased(removed)
            }
            Some(_) => {
                if self.capture.pointer_down(&self.store, page_index, dims, x, y, zoom_percent) {
                    PointerResponse::CaptureStarted
                } else {
                    PointerResponse::Ignored
                }
            }
            None => PointerResponse::Ignored,
        }
    }

    /// Pointer-move while pressed; returns the immediate-feedback segment
    pub fn pointer_move(&mut self, x: f32, y: f32, zoom_percent: u16) -> Option<FeedbackSegment> {
        self.capture.pointer_move(x, y, zoom_percent)
    }

    /// Pointer-up: commit the gesture if it qualifies. Returns the id of
    /// the committed stroke.
    pub fn pointer_up(&mut self) -> Option<StrokeId> {
        let stroke = self.capture.pointer_up()?;
        let id = stroke.id;
        self.commit(stroke);
        Some(id)
    }

    /// Pointer left the canvas: the partial stroke commits (see capture)
    pub fn pointer_leave(&mut self) -> Option<StrokeId> {
        let stroke = self.capture.pointer_leave()?;
        let id = stroke.id;
        self.commit(stroke);
        Some(id)
    }

    /// Undo one step. Restores the document and returns the applied
    /// snapshot so the caller can redraw affected pages.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let snapshot = self.store.undo()?;
        self.document.restore(&snapshot);
        Some(snapshot)
    }

    /// Redo one step, inverse of [`undo`](Self::undo)
    pub fn redo(&mut self) -> Option<Snapshot> {
        let snapshot = self.store.redo()?;
        self.document.restore(&snapshot);
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.can_redo()
    }

    fn commit(&mut self, stroke: crate::stroke::Stroke) {
        self.document.push_stroke(stroke);
        let snapshot = self.document.snapshot();
        self.store.push_snapshot(snapshot);
    }
}
