//! Drawing tools and their rendering rules
//!
//! The tool set is closed: ink pens (fixed color, opaque), the
//! highlighter (fixed color, multiply composite, rendered wider than its
//! nominal width) and the eraser (a removal gesture, not a drawing tool).

use serde::{Deserialize, Serialize};

use crate::stroke::Color;

/// Width multiplier for the highlighter so a highlight reads as a band
/// rather than a line.
pub const HIGHLIGHTER_WIDTH_FACTOR: f32 = 4.0;

/// Highlighter ink opacity. Combined with multiply compositing so that
/// overlapping highlights darken predictably rather than average.
pub const HIGHLIGHTER_OPACITY: f32 = 0.45;

/// Compositing rule recorded on each stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Composite {
    /// Full-opacity ink layered over existing content
    SourceOver,
    /// Translucent multiply blend (highlighter)
    Multiply,
}

/// The active drawing/erasing mode
///
/// Exactly one tool is active at a time; `Option<Tool>::None` at the
/// store level means no drawing is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tool {
    /// Opaque ink pen with a fixed color
    Pen { color: Color },
    /// Translucent band marker, fixed yellow
    Highlighter,
    /// Removal gesture; never produces a stroke
    Eraser,
}

impl Tool {
    /// Convenience constructor for pen variants
    pub fn pen(color: Color) -> Self {
        Tool::Pen { color }
    }

    /// Whether this tool produces strokes. The eraser does not.
    pub fn is_drawing(&self) -> bool {
        !matches!(self, Tool::Eraser)
    }

    /// Ink color for drawing tools, None for the eraser
    pub fn color(&self) -> Option<Color> {
        match self {
            Tool::Pen { color } => Some(*color),
            Tool::Highlighter => Some(Color::YELLOW),
            Tool::Eraser => None,
        }
    }

    /// Compositing rule for drawing tools
    pub fn composite(&self) -> Composite {
        match self {
            Tool::Highlighter => Composite::Multiply,
            _ => Composite::SourceOver,
        }
    }

    /// Ink opacity applied at render time
    pub fn opacity(&self) -> f32 {
        match self {
            Tool::Highlighter => HIGHLIGHTER_OPACITY,
            _ => 1.0,
        }
    }

    /// Effective drawn width for a nominal logical width
    pub fn effective_width(&self, nominal: f32) -> f32 {
        match self {
            Tool::Highlighter => nominal * HIGHLIGHTER_WIDTH_FACTOR,
            _ => nominal,
        }
    }
}
