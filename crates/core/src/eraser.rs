//! Eraser resolver
//!
//! Proximity hit-testing over a page's stroke collection: an erase
//! gesture removes every stroke that passes within a threshold of the
//! gesture point. The threshold is in normalized units so it scales
//! correctly with zoom. Erasing is whole-stroke removal; the caller
//! clears and redraws the page overlay afterwards.

use crate::stroke::{NormPoint, PageStrokes, Stroke, StrokeId};

/// Default erase proximity, as a fraction of the page diagonal-ish unit
/// square. Roughly a fingertip at typical page sizes.
pub const DEFAULT_ERASE_THRESHOLD: f32 = 0.02;

/// Remove every stroke with any point (or segment) within `threshold` of
/// the gesture point. Returns the removed stroke ids; empty when nothing
/// qualified (erasing over blank space is a no-op, not an error).
pub fn erase_at(page: &mut PageStrokes, point: NormPoint, threshold: f32) -> Vec<StrokeId> {
    let hits: Vec<StrokeId> = page
        .iter()
        .filter(|stroke| stroke_near_point(stroke, &point, threshold))
        .map(|stroke| stroke.id)
        .collect();
    page.remove_ids(&hits);
    hits
}

/// Whether a stroke passes within `threshold` of a point.
///
/// Checks point proximity and segment proximity, so a sparsely-sampled
/// stroke still erases when the gesture lands between samples.
pub fn stroke_near_point(stroke: &Stroke, point: &NormPoint, threshold: f32) -> bool {
    if stroke.points.iter().any(|p| p.distance_to(point) <= threshold) {
        return true;
    }
    stroke
        .points
        .windows(2)
        .any(|pair| point_near_segment(point, &pair[0], &pair[1], threshold))
}

fn point_near_segment(point: &NormPoint, start: &NormPoint, end: &NormPoint, threshold: f32) -> bool {
    let du = end.u - start.u;
    let dv = end.v - start.v;
    let length_sq = du * du + dv * dv;

    if length_sq < 1e-12 {
        // Degenerate segment
        return point.distance_to(start) <= threshold;
    }

    let t = ((point.u - start.u) * du + (point.v - start.v) * dv) / length_sq;
    let t = t.clamp(0.0, 1.0);

    let closest = NormPoint::new(start.u + t * du, start.v + t * dv);
    point.distance_to(&closest) <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::Color;
    use crate::tool::Tool;

    fn stroke_along(points: &[(f32, f32)]) -> Stroke {
        let points = points.iter().map(|&(u, v)| NormPoint::new(u, v)).collect();
        Stroke::new(1, points, Tool::pen(Color::BLACK), 2.0)
    }

    #[test]
    fn test_erase_removes_nearest_stroke() {
        let mut page = PageStrokes::new();
        let near = stroke_along(&[(0.10, 0.10), (0.20, 0.10)]);
        let far = stroke_along(&[(0.80, 0.80), (0.90, 0.90)]);
        let near_id = near.id;
        page.push(near);
        page.push(far.clone());

        let removed = erase_at(&mut page, NormPoint::new(0.15, 0.105), 0.02);
        assert_eq!(removed, vec![near_id]);
        assert_eq!(page.len(), 1);
        assert_eq!(page.as_slice()[0].id, far.id);
    }

    #[test]
    fn test_one_gesture_can_remove_multiple_strokes() {
        let mut page = PageStrokes::new();
        page.push(stroke_along(&[(0.50, 0.50), (0.52, 0.50)]));
        page.push(stroke_along(&[(0.50, 0.51), (0.52, 0.51)]));
        page.push(stroke_along(&[(0.10, 0.10), (0.12, 0.10)]));

        let removed = erase_at(&mut page, NormPoint::new(0.51, 0.505), 0.02);
        assert_eq!(removed.len(), 2);
        assert_eq!(page.len(), 1);
    }

    #[test]
    fn test_erase_far_from_everything_is_idempotent() {
        let mut page = PageStrokes::new();
        page.push(stroke_along(&[(0.10, 0.10), (0.20, 0.10)]));
        let before = page.clone();

        let removed = erase_at(&mut page, NormPoint::new(0.90, 0.90), 0.02);
        assert!(removed.is_empty());
        assert_eq!(page, before);
    }

    #[test]
    fn test_erase_on_empty_page_is_a_no_op() {
        let mut page = PageStrokes::new();
        let removed = erase_at(&mut page, NormPoint::new(0.5, 0.5), 0.02);
        assert!(removed.is_empty());
        assert!(page.is_empty());
    }

    #[test]
    fn test_segment_proximity_catches_sparse_strokes() {
        // Two samples far apart; the gesture lands between them, close to
        // the line but far from either sample.
        let mut page = PageStrokes::new();
        page.push(stroke_along(&[(0.10, 0.50), (0.90, 0.50)]));

        let removed = erase_at(&mut page, NormPoint::new(0.50, 0.51), 0.02);
        assert_eq!(removed.len(), 1);
    }
}
