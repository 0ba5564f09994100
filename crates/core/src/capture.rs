//! Stroke capture state machine
//!
//! Turns a pointer-down / move / up gesture into an ordered stroke of
//! normalized points styled by the active tool. One state machine per
//! pointer sequence: Idle -> Capturing -> Idle. Pointer events are
//! handled synchronously and serially; there is no parallel capture.
//!
//! Policy: leaving the canvas mid-stroke commits whatever has been
//! captured so far, same as pointer-up. Strokes of fewer than 2 points
//! are dropped silently.

use crate::coords::{self, PageDimensions};
use crate::store::ToolHistoryStore;
use crate::stroke::{Color, NormPoint, PageIndex, Stroke};
use crate::tool::{Composite, Tool};

/// Incremental screen-space segment for immediate visual feedback while
/// the stroke is still in progress. Projected at the zoom level of the
/// triggering pointer event, so a zoom change mid-stroke only changes the
/// projection, never the captured normalized points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackSegment {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub width_px: f32,
    pub color: Color,
    pub opacity: f32,
    pub composite: Composite,
}

#[derive(Debug)]
struct InProgress {
    page_index: PageIndex,
    dims: PageDimensions,
    tool: Tool,
    width: f32,
    points: Vec<NormPoint>,
}

#[derive(Debug, Default)]
enum CaptureState {
    #[default]
    Idle,
    Capturing(InProgress),
}

/// Pointer-gesture capture engine
#[derive(Debug, Default)]
pub struct StrokeCapture {
    state: CaptureState,
}

impl StrokeCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, CaptureState::Capturing(_))
    }

    /// Pointer-down on a page. Starts capturing if a drawing tool (not
    /// eraser, not none) is active; returns whether capture started.
    pub fn pointer_down(
        &mut self,
        store: &ToolHistoryStore,
        page_index: PageIndex,
        dims: PageDimensions,
        x: f32,
        y: f32,
        zoom_percent: u16,
    ) -> bool {
        let Some(tool) = store.active_tool() else {
            return false;
        };
        if !tool.is_drawing() {
            return false;
        }

        let first = coords::to_normalized(x, y, dims, zoom_percent);
        self.state = CaptureState::Capturing(InProgress {
            page_index,
            dims,
            tool,
            width: store.stroke_width(),
            points: vec![first],
        });
        true
    }

    /// Pointer-move while pressed. Appends the normalized point and
    /// returns the incremental segment to draw immediately, or None when
    /// not capturing.
    pub fn pointer_move(&mut self, x: f32, y: f32, zoom_percent: u16) -> Option<FeedbackSegment> {
        let CaptureState::Capturing(progress) = &mut self.state else {
            return None;
        };

        let point = coords::to_normalized(x, y, progress.dims, zoom_percent);
        let last = *progress.points.last()?;
        progress.points.push(point);

        let tool = progress.tool;
        Some(FeedbackSegment {
            from: coords::to_screen(last, progress.dims, zoom_percent),
            to: coords::to_screen(point, progress.dims, zoom_percent),
            width_px: coords::width_to_screen(tool.effective_width(progress.width), zoom_percent),
            color: tool.color().unwrap_or(Color::BLACK),
            opacity: tool.opacity(),
            composite: tool.composite(),
        })
    }

    /// Pointer-up: end the gesture. Returns the committed stroke when the
    /// capture collected at least 2 points; a tap is dropped silently.
    pub fn pointer_up(&mut self) -> Option<Stroke> {
        self.finish()
    }

    /// Pointer left the canvas mid-stroke: commits the partial stroke.
    pub fn pointer_leave(&mut self) -> Option<Stroke> {
        self.finish()
    }

    /// The active tool changed while capturing: ends and commits the
    /// in-progress stroke with the tool it was started with.
    pub fn tool_switched(&mut self) -> Option<Stroke> {
        self.finish()
    }

    fn finish(&mut self) -> Option<Stroke> {
        let CaptureState::Capturing(progress) = std::mem::take(&mut self.state) else {
            return None;
        };
        if progress.points.len() < 2 {
            return None;
        }
        Some(Stroke::new(progress.page_index, progress.points, progress.tool, progress.width))
    }
}
