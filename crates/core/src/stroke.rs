//! Stroke data model
//!
//! Strokes are stored in normalized page space: every coordinate is a
//! fraction of the page's width/height, independent of zoom or pixel
//! resolution. Committed strokes are immutable; erasing removes a stroke
//! from its page's collection rather than mutating it.

use serde::{Deserialize, Serialize};

use crate::tool::Tool;

/// Unique identifier for a stroke
///
/// Stable across the stroke's lifetime, survives save/load, and is the
/// handle the notes/commentary collaborator attaches threads to.
pub type StrokeId = uuid::Uuid;

/// 1-based page index
pub type PageIndex = u32;

/// A point in normalized page space
///
/// Both components are fractions of the page dimensions, clamped to
/// [0, 1]. (0, 0) is the top-left corner of the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormPoint {
    pub u: f32,
    pub v: f32,
}

impl NormPoint {
    /// Create a normalized point, clamping both components to [0, 1]
    pub fn new(u: f32, v: f32) -> Self {
        Self { u: u.clamp(0.0, 1.0), v: v.clamp(0.0, 1.0) }
    }

    /// Distance to another normalized point
    pub fn distance_to(&self, other: &NormPoint) -> f32 {
        let du = self.u - other.u;
        let dv = self.v - other.v;
        (du * du + dv * dv).sqrt()
    }
}

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create an opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert to normalized RGBA values (0.0 to 1.0)
    pub fn to_normalized(&self) -> (f32, f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(220, 38, 38);
    pub const GREEN: Color = Color::rgb(22, 163, 74);
    pub const BLUE: Color = Color::rgb(37, 99, 235);
    pub const YELLOW: Color = Color::rgb(250, 204, 21);
}

/// One committed pointer gesture
///
/// An ordered sequence of normalized points plus the style it was drawn
/// with. The style is recorded at commit time so that switching tools
/// later never alters existing ink. A stroke with fewer than 2 points is
/// a tap, not a gesture, and is never committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Stable unique identifier
    pub id: StrokeId,

    /// Page this stroke belongs to (1-based)
    pub page_index: PageIndex,

    /// Ordered points in normalized page space
    pub points: Vec<NormPoint>,

    /// Tool the stroke was drawn with
    pub tool: Tool,

    /// Recorded color (copied from the tool at commit time)
    pub color: Color,

    /// Logical width, independent of zoom
    pub width: f32,

    /// Opaque reference id for the notes/commentary collaborator.
    /// Preserved verbatim through save/load, never interpreted here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_ref: Option<String>,
}

impl Stroke {
    /// Create a stroke with a generated id
    pub fn new(page_index: PageIndex, points: Vec<NormPoint>, tool: Tool, width: f32) -> Self {
        Self {
            id: StrokeId::new_v4(),
            page_index,
            points,
            tool,
            color: tool.color().unwrap_or(Color::BLACK),
            width,
            note_ref: None,
        }
    }

    /// Bounding box in normalized space as (min_u, min_v, max_u, max_v)
    pub fn bounding_box(&self) -> (f32, f32, f32, f32) {
        if self.points.is_empty() {
            return (0.0, 0.0, 0.0, 0.0);
        }
        let mut min_u = self.points[0].u;
        let mut max_u = self.points[0].u;
        let mut min_v = self.points[0].v;
        let mut max_v = self.points[0].v;
        for p in self.points.iter().skip(1) {
            min_u = min_u.min(p.u);
            max_u = max_u.max(p.u);
            min_v = min_v.min(p.v);
            max_v = max_v.max(p.v);
        }
        (min_u, min_v, max_u, max_v)
    }
}

/// Insertion-ordered stroke collection for one page
///
/// Insertion order is z-order for rendering and the linearization order
/// for undo. Only the capture engine appends and the eraser removes, both
/// on the UI thread, so no interior locking is needed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageStrokes {
    strokes: Vec<Stroke>,
}

impl PageStrokes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a committed stroke (z-order = insertion order)
    pub fn push(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    /// Remove strokes by id, preserving the order of the remainder
    pub fn remove_ids(&mut self, ids: &[StrokeId]) {
        if ids.is_empty() {
            return;
        }
        self.strokes.retain(|s| !ids.contains(&s.id));
    }

    /// Strokes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Stroke> {
        self.strokes.iter()
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    pub fn as_slice(&self) -> &[Stroke] {
        &self.strokes
    }
}
