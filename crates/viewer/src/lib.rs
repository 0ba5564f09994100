//! Page virtualization for the annotation viewer
//!
//! Decides which pages are near the viewport and requests rasterization
//! only for those, recycling the rest to lightweight placeholders. The
//! page source is an external collaborator behind the [`PageSource`]
//! trait; a page it cannot produce stays a placeholder indefinitely and
//! is reported once, never retried in a tight loop.
//!
//! Page indices are 1-based throughout, matching the stroke model.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::RangeInclusive;

use inklayer_core::{PageDimensions, PageIndex};

/// Rasterization failure from the external page source
#[derive(Debug, thiserror::Error)]
pub enum PageSourceError {
    #[error("page {0} out of range")]
    OutOfRange(PageIndex),
    #[error("failed to rasterize page {page}: {reason}")]
    Rasterize { page: PageIndex, reason: String },
}

/// A rasterized page image at some scale
#[derive(Debug, Clone)]
pub struct PageRaster {
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// RGBA8, row-major, `pixel_width * pixel_height * 4` bytes
    pub pixels: Vec<u8>,
}

/// External provider of page count and page rasters
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// Rasterize one page at the given scale (1.0 = reference scale).
    /// Returns the image plus its native pixel dimensions.
    fn get_page(&self, index: PageIndex, scale: f32) -> Result<PageRaster, PageSourceError>;
}

/// Current scroll/viewport position over the vertically stacked pages
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    pub zoom_percent: u16,
    pub viewport_height_px: f32,
    pub scroll_offset_px: f32,
    /// Per-page heights at the current zoom; element 0 is page 1
    pub page_heights_px: Vec<f32>,
    pub page_spacing_px: f32,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom_percent: 100,
            viewport_height_px: 800.0,
            scroll_offset_px: 0.0,
            page_heights_px: vec![1000.0],
            page_spacing_px: 16.0,
        }
    }
}

/// Pages intersecting the viewport, as an inclusive 1-based range
pub fn visible_pages(state: &ViewportState) -> RangeInclusive<PageIndex> {
    if state.page_heights_px.is_empty() {
        return 1..=1;
    }

    let start = page_at_offset(state.scroll_offset_px.max(0.0), state);
    let end = page_at_offset((state.scroll_offset_px + state.viewport_height_px).max(0.0), state);

    start..=end
}

/// The page whose band contains the viewport center
pub fn current_page(state: &ViewportState) -> PageIndex {
    if state.page_heights_px.is_empty() {
        return 1;
    }

    let center = (state.scroll_offset_px + state.viewport_height_px / 2.0).max(0.0);
    page_at_offset(center, state)
}

/// Pages that should be rendered: the visible range widened by `margin`
/// neighbors on each side, clamped to the document.
pub fn render_set(state: &ViewportState, margin: u32) -> BTreeSet<PageIndex> {
    let page_count = state.page_heights_px.len() as u32;
    if page_count == 0 {
        return BTreeSet::new();
    }

    let range = visible_pages(state);
    let first = range.start().saturating_sub(margin).max(1);
    let last = (*range.end() + margin).min(page_count);

    (first..=last).collect()
}

/// Zoom percentage filling the viewport width with the page width
pub fn fit_width_percent(viewport_width_px: f32, page_width_px: f32) -> u16 {
    if viewport_width_px <= 0.0 || page_width_px <= 0.0 {
        return 100;
    }

    ((viewport_width_px / page_width_px) * 100.0).round().clamp(10.0, 1600.0) as u16
}

/// Zoom percentage fitting the whole page inside the viewport
pub fn fit_page_percent(
    viewport_width_px: f32,
    viewport_height_px: f32,
    page_width_px: f32,
    page_height_px: f32,
) -> u16 {
    if viewport_width_px <= 0.0
        || viewport_height_px <= 0.0
        || page_width_px <= 0.0
        || page_height_px <= 0.0
    {
        return 100;
    }

    let width = viewport_width_px / page_width_px;
    let height = viewport_height_px / page_height_px;

    (width.min(height) * 100.0).round().clamp(10.0, 1600.0) as u16
}

fn page_at_offset(offset: f32, state: &ViewportState) -> PageIndex {
    let mut cursor = 0.0;

    for (i, page_height) in state.page_heights_px.iter().enumerate() {
        let page_end = cursor + page_height;
        if offset <= page_end {
            return i as PageIndex + 1;
        }

        cursor = page_end + state.page_spacing_px;
    }

    state.page_heights_px.len() as PageIndex
}

/// Lifecycle state for one page's surface
#[derive(Debug)]
pub enum PageSlot {
    /// Dimensions may be known (from a previous render); content absent
    Placeholder { dimensions: Option<PageDimensions> },
    /// Base raster present and ready for overlay drawing. The scale it
    /// was rasterized at is recorded so a zoom change invalidates it.
    Ready { dimensions: PageDimensions, raster: PageRaster, scale: f32 },
    /// The source could not produce this page; reported once, not retried
    Failed,
}

/// What one [`Virtualizer::sync`] pass did
#[derive(Debug, Default, PartialEq)]
pub struct SyncReport {
    pub rendered: Vec<PageIndex>,
    pub torn_down: Vec<PageIndex>,
    pub failed: Vec<PageIndex>,
}

/// Owns page-surface lifecycle so stroke logic stays orthogonal to page
/// creation and teardown.
#[derive(Debug)]
pub struct Virtualizer {
    margin: u32,
    slots: BTreeMap<PageIndex, PageSlot>,
    reported_failures: HashSet<PageIndex>,
}

impl Virtualizer {
    /// Default margin of one neighbor page on each side
    pub fn new() -> Self {
        Self::with_margin(1)
    }

    pub fn with_margin(margin: u32) -> Self {
        Self { margin, slots: BTreeMap::new(), reported_failures: HashSet::new() }
    }

    pub fn slot(&self, page: PageIndex) -> Option<&PageSlot> {
        self.slots.get(&page)
    }

    pub fn is_rendered(&self, page: PageIndex) -> bool {
        matches!(self.slots.get(&page), Some(PageSlot::Ready { .. }))
    }

    /// Native dimensions at reference scale, once known for a page
    pub fn dimensions(&self, page: PageIndex) -> Option<PageDimensions> {
        match self.slots.get(&page)? {
            PageSlot::Ready { dimensions, .. } => Some(*dimensions),
            PageSlot::Placeholder { dimensions } => *dimensions,
            PageSlot::Failed => None,
        }
    }

    /// Reconcile the slot map with the viewport.
    ///
    /// Requests rasterization for pages entering the render window and
    /// tears pages outside it down to placeholders (dimensions kept).
    /// Requesting an already-rendered page at an unchanged zoom is a
    /// no-op; after a zoom change the page is re-rasterized at the new
    /// scale. A failed page is skipped on every later pass.
    pub fn sync(&mut self, state: &ViewportState, source: &dyn PageSource) -> SyncReport {
        let mut report = SyncReport::default();
        let needed = render_set(state, self.margin);
        let scale = state.zoom_percent as f32 / 100.0;

        // Tear down rendered pages that left the window.
        let rendered_now: Vec<PageIndex> = self
            .slots
            .iter()
            .filter(|(page, slot)| matches!(slot, PageSlot::Ready { .. }) && !needed.contains(page))
            .map(|(page, _)| *page)
            .collect();
        for page in rendered_now {
            if let Some(PageSlot::Ready { dimensions, .. }) = self.slots.remove(&page) {
                self.slots.insert(page, PageSlot::Placeholder { dimensions: Some(dimensions) });
            }
            report.torn_down.push(page);
        }

        for page in needed {
            match self.slots.get(&page) {
                Some(PageSlot::Ready { scale: rendered_scale, .. })
                    if (rendered_scale - scale).abs() < 1e-3 =>
                {
                    continue;
                }
                Some(PageSlot::Failed) => continue,
                _ => {}
            }

            match source.get_page(page, scale) {
                Ok(raster) => {
                    let dimensions = PageDimensions::new(
                        raster.pixel_width as f32 / scale,
                        raster.pixel_height as f32 / scale,
                    );
                    self.slots.insert(page, PageSlot::Ready { dimensions, raster, scale });
                    report.rendered.push(page);
                }
                Err(err) => {
                    if self.reported_failures.insert(page) {
                        log::warn!("page {page} left as placeholder: {err}");
                    }
                    self.slots.insert(page, PageSlot::Failed);
                    report.failed.push(page);
                }
            }
        }

        report
    }
}

impl Default for Virtualizer {
    fn default() -> Self {
        Self::new()
    }
}
