//! Stroke replay onto a drawing surface.
//!
//! Committed ink is never mutated in place on screen. Whenever the set of
//! strokes for a page changes (commit, erase, undo, redo) the page overlay
//! is cleared and every remaining stroke is replayed in insertion order.
//! Each stroke carries its own tool, color, and width, so replay is
//! independent of whatever tool is currently selected.

use image::RgbaImage;
use inklayer_core::{to_screen, FeedbackSegment, PageDimensions, Stroke};

use crate::surface::{DrawSurface, SoftwareSurface};

/// Clears the surface and replays all strokes for one page.
///
/// Strokes are drawn oldest first, so later ink composites over earlier
/// ink. The call is idempotent: replaying the same strokes at the same
/// zoom produces identical surface contents.
pub fn redraw(
    surface: &mut dyn DrawSurface,
    strokes: &[Stroke],
    dimensions: PageDimensions,
    zoom_percent: u16,
) {
    surface.clear();
    for stroke in strokes {
        draw_stroke(surface, stroke, dimensions, zoom_percent);
    }
}

/// Draws one stroke without clearing first. Used for incremental live
/// feedback while a stroke is still being captured.
pub fn draw_stroke(
    surface: &mut dyn DrawSurface,
    stroke: &Stroke,
    dimensions: PageDimensions,
    zoom_percent: u16,
) {
    if stroke.points.len() < 2 {
        return;
    }
    let width_px =
        inklayer_core::width_to_screen(stroke.tool.effective_width(stroke.width), zoom_percent);
    let color = stroke.color;
    let opacity = stroke.tool.opacity();
    let composite = stroke.tool.composite();
    for pair in stroke.points.windows(2) {
        let from = to_screen(pair[0], dimensions, zoom_percent);
        let to = to_screen(pair[1], dimensions, zoom_percent);
        surface.stroke_segment(from, to, width_px, color, opacity, composite);
    }
}

/// Draws a single live-feedback segment produced during capture.
pub fn draw_feedback(surface: &mut dyn DrawSurface, segment: &FeedbackSegment) {
    surface.stroke_segment(
        segment.from,
        segment.to,
        segment.width_px,
        segment.color,
        segment.opacity,
        segment.composite,
    );
}

/// Composites a page's strokes onto a copy of its rendered raster.
///
/// The base image defines the output resolution; stroke coordinates are
/// projected at the zoom implied by the base width so ink lands where it
/// did on screen. Returns the merged image, leaving the base untouched.
pub fn flatten(base: &RgbaImage, strokes: &[Stroke], dimensions: PageDimensions) -> RgbaImage {
    let mut surface = SoftwareSurface::from_image(base);
    let zoom_percent = if dimensions.width_px > 0.0 {
        ((base.width() as f32 / dimensions.width_px) * 100.0)
            .round()
            .clamp(1.0, u16::MAX as f32) as u16
    } else {
        100
    };
    for stroke in strokes {
        draw_stroke(&mut surface, stroke, dimensions, zoom_percent);
    }
    surface.into_image()
}
