//! Screen/normalized coordinate projection
//!
//! Strokes are always stored in normalized page space, so re-rendering
//! after a zoom change requires no stroke mutation, only re-projection
//! through these two functions.

use serde::{Deserialize, Serialize};

use crate::stroke::NormPoint;

/// Native pixel dimensions of a page at the reference scale (zoom 100%)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width_px: f32,
    pub height_px: f32,
}

impl PageDimensions {
    pub fn new(width_px: f32, height_px: f32) -> Self {
        Self { width_px, height_px }
    }

    /// Pixel dimensions at a zoom percentage
    pub fn at_zoom(&self, zoom_percent: u16) -> (f32, f32) {
        let scale = zoom_percent as f32 / 100.0;
        (self.width_px * scale, self.height_px * scale)
    }
}

/// Convert a screen-pixel position (page-local, at the current zoom) to a
/// normalized point. Out-of-page positions clamp to the page edge.
pub fn to_normalized(x: f32, y: f32, dims: PageDimensions, zoom_percent: u16) -> NormPoint {
    let (w, h) = dims.at_zoom(zoom_percent);
    if w <= 0.0 || h <= 0.0 {
        return NormPoint::new(0.0, 0.0);
    }
    NormPoint::new(x / w, y / h)
}

/// Project a normalized point to page-local screen pixels at the current
/// zoom level.
pub fn to_screen(p: NormPoint, dims: PageDimensions, zoom_percent: u16) -> (f32, f32) {
    let (w, h) = dims.at_zoom(zoom_percent);
    (p.u * w, p.v * h)
}

/// Screen-pixel width for a logical stroke width at the current zoom
pub fn width_to_screen(logical_width: f32, zoom_percent: u16) -> f32 {
    logical_width * zoom_percent as f32 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIMS: PageDimensions = PageDimensions { width_px: 800.0, height_px: 1000.0 };

    #[test]
    fn test_round_trip_is_lossless_across_zoom_levels() {
        // Capture at one zoom, project at another: the normalized form is
        // the invariant, so the relative position must survive.
        let captured = to_normalized(200.0, 750.0, DIMS, 100);
        assert!((captured.u - 0.25).abs() < 1e-6);
        assert!((captured.v - 0.75).abs() < 1e-6);

        let (x2, y2) = to_screen(captured, DIMS, 200);
        assert!((x2 - 400.0).abs() < 1e-3);
        assert!((y2 - 1500.0).abs() < 1e-3);

        let back = to_normalized(x2, y2, DIMS, 200);
        assert!((back.u - captured.u).abs() < 1e-6);
        assert!((back.v - captured.v).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_page_input_clamps() {
        let p = to_normalized(-50.0, 1200.0, DIMS, 100);
        assert_eq!(p.u, 0.0);
        assert_eq!(p.v, 1.0);
    }

    #[test]
    fn test_degenerate_dimensions_map_to_origin() {
        let p = to_normalized(10.0, 10.0, PageDimensions::new(0.0, 0.0), 100);
        assert_eq!(p.u, 0.0);
        assert_eq!(p.v, 0.0);
    }

    #[test]
    fn test_stroke_width_scales_with_zoom() {
        assert_eq!(width_to_screen(4.0, 100), 4.0);
        assert_eq!(width_to_screen(4.0, 200), 8.0);
        assert_eq!(width_to_screen(4.0, 50), 2.0);
    }
}
