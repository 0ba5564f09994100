//! Tool and history store
//!
//! Session-lifetime state holding the active tool, the active stroke
//! width, and a bounded linear undo/redo stack of document snapshots.
//! The store is explicitly owned and passed to the components that need
//! it; capture and the undo/redo entry points are its only writers. It
//! never touches pixels; `undo`/`redo` hand the snapshot to the caller,
//! which restores the document and redraws.

use crate::tool::Tool;

/// Maximum number of undo entries retained. Oldest entries beyond the cap
/// are discarded silently; this is a policy choice, not a fault.
pub const HISTORY_CAPACITY: usize = 50;

/// Opaque serialized form of all strokes across the document at a point
/// in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(String);

impl Snapshot {
    pub fn new(serialized: impl Into<String>) -> Self {
        Self(serialized.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Process-wide tool selection plus linear undo/redo history
#[derive(Debug)]
pub struct ToolHistoryStore {
    active_tool: Option<Tool>,
    stroke_width: f32,
    past: Vec<Snapshot>,
    present: Snapshot,
    future: Vec<Snapshot>,
    capacity: usize,
}

impl ToolHistoryStore {
    /// Create a store whose history starts at the given snapshot
    /// (typically the empty document, or whatever was loaded).
    pub fn new(initial: Snapshot) -> Self {
        Self {
            active_tool: None,
            stroke_width: 3.0,
            past: Vec::new(),
            present: initial,
            future: Vec::new(),
            capacity: HISTORY_CAPACITY,
        }
    }

    #[cfg(test)]
    fn with_capacity(initial: Snapshot, capacity: usize) -> Self {
        let mut store = Self::new(initial);
        store.capacity = capacity.max(1);
        store
    }

    pub fn active_tool(&self) -> Option<Tool> {
        self.active_tool
    }

    pub fn set_active_tool(&mut self, tool: Option<Tool>) {
        self.active_tool = tool;
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.stroke_width = width.max(0.5);
    }

    /// Record a new state after a commit or an erase.
    ///
    /// No-op if the snapshot is identical to the current state (redundant
    /// re-renders must not produce duplicate history entries). Otherwise
    /// the current state moves to the past stack (trimming the oldest
    /// entry beyond capacity) and the redo branch is discarded.
    pub fn push_snapshot(&mut self, snapshot: Snapshot) {
        if snapshot == self.present {
            return;
        }
        self.past.push(std::mem::replace(&mut self.present, snapshot));
        if self.past.len() > self.capacity {
            self.past.remove(0);
        }
        self.future.clear();
    }

    /// Step back one state. Returns the snapshot the caller must restore
    /// and redraw, or None if there is nothing to undo.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let previous = self.past.pop()?;
        self.future.push(std::mem::replace(&mut self.present, previous));
        Some(self.present.clone())
    }

    /// Step forward one state. Returns the snapshot to restore, or None
    /// if there is nothing to redo.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let next = self.future.pop()?;
        self.past.push(std::mem::replace(&mut self.present, next));
        Some(self.present.clone())
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// The state the store currently considers live
    pub fn present(&self) -> &Snapshot {
        &self.present
    }
}
