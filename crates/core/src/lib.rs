//! Inklayer core
//!
//! Stroke data model and drawing state for the freehand annotation
//! engine: normalized coordinates, capture state machine, tool and
//! history store, eraser resolver, per-document page state.

pub mod capture;
pub mod coords;
pub mod document;
pub mod engine;
pub mod eraser;
pub mod store;
pub mod stroke;
pub mod tool;

pub use capture::{FeedbackSegment, StrokeCapture};
pub use coords::{to_normalized, to_screen, width_to_screen, PageDimensions};
pub use document::{Document, PageState};
pub use engine::{AnnotationEngine, PointerResponse};
pub use eraser::{erase_at, stroke_near_point, DEFAULT_ERASE_THRESHOLD};
pub use store::{Snapshot, ToolHistoryStore, HISTORY_CAPACITY};
pub use stroke::{Color, NormPoint, PageIndex, PageStrokes, Stroke, StrokeId};
pub use tool::{Composite, Tool, HIGHLIGHTER_OPACITY, HIGHLIGHTER_WIDTH_FACTOR};
