//! Software rendering for ink overlays.
//!
//! This crate turns committed strokes back into pixels. It owns the
//! surface abstraction ([`DrawSurface`]), a CPU implementation
//! ([`SoftwareSurface`]), and the replay functions that clear and
//! repaint a page overlay whenever its stroke set changes.

pub mod renderer;
pub mod surface;

pub use renderer::{draw_feedback, draw_stroke, flatten, redraw};
pub use surface::{DrawSurface, SoftwareSurface};
