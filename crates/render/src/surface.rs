//! Drawing surfaces for stroke rasterization.
//!
//! The renderer talks to a [`DrawSurface`] rather than a concrete pixel
//! buffer, so the same replay logic drives the in-memory software surface
//! here and any host-provided canvas an embedding application supplies.

use image::RgbaImage;
use inklayer_core::{Color, Composite};

/// Abstract target for stroke drawing.
///
/// Coordinates are in surface pixels with the origin at the top-left.
/// Implementations blend each segment according to the requested
/// composite mode and opacity.
pub trait DrawSurface {
    /// Surface width in pixels.
    fn width(&self) -> u32;

    /// Surface height in pixels.
    fn height(&self) -> u32;

    /// Resets the surface to its initial contents.
    fn clear(&mut self);

    /// Draws one stroke segment as a capsule (line with round caps).
    #[allow(clippy::too_many_arguments)]
    fn stroke_segment(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        width_px: f32,
        color: Color,
        opacity: f32,
        composite: Composite,
    );
}

/// CPU-side RGBA surface backed by a plain byte buffer.
///
/// Pixels are stored straight (not premultiplied), four bytes per pixel
/// in RGBA order. A freshly created surface is fully transparent; a
/// surface built from a base image keeps that image as its clear state.
pub struct SoftwareSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    base: Option<Vec<u8>>,
}

impl SoftwareSurface {
    /// Creates a transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize) * 4;
        Self {
            width,
            height,
            pixels: vec![0; len],
            base: None,
        }
    }

    /// Creates a surface whose initial (and cleared) contents are the
    /// given image. Used when flattening ink onto a page raster.
    pub fn from_image(image: &RgbaImage) -> Self {
        let pixels = image.as_raw().clone();
        Self {
            width: image.width(),
            height: image.height(),
            base: Some(pixels.clone()),
            pixels,
        }
    }

    /// Consumes the surface and returns its pixels as an image.
    pub fn into_image(self) -> RgbaImage {
        // Buffer length always matches width * height * 4.
        RgbaImage::from_raw(self.width, self.height, self.pixels)
            .unwrap_or_else(|| RgbaImage::new(0, 0))
    }

    /// Raw RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Reads one pixel as (r, g, b, a). Out-of-bounds reads return
    /// transparent black.
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        if x >= self.width || y >= self.height {
            return (0, 0, 0, 0);
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        (
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        )
    }

    fn blend_pixel(&mut self, x: u32, y: u32, color: Color, alpha: f32, composite: Composite) {
        if x >= self.width || y >= self.height || alpha <= 0.0 {
            return;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let (dr, dg, db, da) = (
            self.pixels[i] as f32 / 255.0,
            self.pixels[i + 1] as f32 / 255.0,
            self.pixels[i + 2] as f32 / 255.0,
            self.pixels[i + 3] as f32 / 255.0,
        );
        let (sr, sg, sb, sa) = color.to_normalized();
        let a = (sa * alpha).clamp(0.0, 1.0);

        let (or, og, ob) = match composite {
            Composite::SourceOver => (
                sr * a + dr * (1.0 - a),
                sg * a + dg * (1.0 - a),
                sb * a + db * (1.0 - a),
            ),
            Composite::Multiply => {
                // Uncovered destination behaves as white, so multiply
                // over a transparent surface leaves the ink color
                // scaled only by its own opacity.
                let er = dr * da + (1.0 - da);
                let eg = dg * da + (1.0 - da);
                let eb = db * da + (1.0 - da);
                (
                    er * (1.0 - a) + er * sr * a,
                    eg * (1.0 - a) + eg * sg * a,
                    eb * (1.0 - a) + eb * sb * a,
                )
            }
        };
        let oa = a + da * (1.0 - a);

        self.pixels[i] = (or * 255.0).round().clamp(0.0, 255.0) as u8;
        self.pixels[i + 1] = (og * 255.0).round().clamp(0.0, 255.0) as u8;
        self.pixels[i + 2] = (ob * 255.0).round().clamp(0.0, 255.0) as u8;
        self.pixels[i + 3] = (oa * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

impl DrawSurface for SoftwareSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        match &self.base {
            Some(base) => self.pixels.copy_from_slice(base),
            None => self.pixels.fill(0),
        }
    }

    fn stroke_segment(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        width_px: f32,
        color: Color,
        opacity: f32,
        composite: Composite,
    ) {
        let radius = (width_px / 2.0).max(0.5);

        let min_x = (from.0.min(to.0) - radius).floor().max(0.0) as u32;
        let max_x = (from.0.max(to.0) + radius).ceil().min(self.width as f32) as u32;
        let min_y = (from.1.min(to.1) - radius).floor().max(0.0) as u32;
        let max_y = (from.1.max(to.1) + radius).ceil().min(self.height as f32) as u32;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let cx = x as f32 + 0.5;
                let cy = y as f32 + 0.5;
                let dist = distance_to_segment((cx, cy), from, to);
                if dist > radius {
                    continue;
                }
                // One pixel of antialiasing at the capsule edge.
                let coverage = (radius - dist).clamp(0.0, 1.0);
                self.blend_pixel(x, y, color, opacity * coverage, composite);
            }
        }
    }
}

fn distance_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let abx = b.0 - a.0;
    let aby = b.1 - a.1;
    let len_sq = abx * abx + aby * aby;
    if len_sq < 1e-12 {
        let dx = p.0 - a.0;
        let dy = p.1 - a.1;
        return (dx * dx + dy * dy).sqrt();
    }
    let t = (((p.0 - a.0) * abx + (p.1 - a.1) * aby) / len_sq).clamp(0.0, 1.0);
    let qx = a.0 + t * abx;
    let qy = a.1 + t * aby;
    let dx = p.0 - qx;
    let dy = p.1 - qy;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_surface_is_transparent() {
        let surface = SoftwareSurface::new(4, 4);
        assert_eq!(surface.pixel(0, 0), (0, 0, 0, 0));
        assert_eq!(surface.pixel(3, 3), (0, 0, 0, 0));
    }

    #[test]
    fn test_source_over_opaque_replaces_pixel() {
        let mut surface = SoftwareSurface::new(8, 8);
        surface.stroke_segment(
            (1.0, 4.0),
            (7.0, 4.0),
            4.0,
            Color::rgb(10, 20, 30),
            1.0,
            Composite::SourceOver,
        );
        let (r, g, b, a) = surface.pixel(4, 4);
        assert_eq!((r, g, b), (10, 20, 30));
        assert_eq!(a, 255);
    }

    #[test]
    fn test_pixels_outside_radius_untouched() {
        let mut surface = SoftwareSurface::new(16, 16);
        surface.stroke_segment(
            (2.0, 2.0),
            (6.0, 2.0),
            2.0,
            Color::BLACK,
            1.0,
            Composite::SourceOver,
        );
        assert_eq!(surface.pixel(12, 12), (0, 0, 0, 0));
    }

    #[test]
    fn test_multiply_darkens_covered_base() {
        let white = RgbaImage::from_pixel(8, 8, image::Rgba([255, 255, 255, 255]));
        let mut surface = SoftwareSurface::from_image(&white);
        surface.stroke_segment(
            (0.0, 4.0),
            (8.0, 4.0),
            4.0,
            Color::YELLOW,
            0.45,
            Composite::Multiply,
        );
        let (r, g, b, a) = surface.pixel(4, 4);
        // Yellow multiply: red barely changes, blue drops sharply.
        assert!(r > 240);
        assert!(b < 200);
        assert!(b < g);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_multiply_twice_is_darker_than_once() {
        let white = RgbaImage::from_pixel(8, 8, image::Rgba([255, 255, 255, 255]));
        let mut once = SoftwareSurface::from_image(&white);
        once.stroke_segment(
            (0.0, 4.0),
            (8.0, 4.0),
            4.0,
            Color::YELLOW,
            0.45,
            Composite::Multiply,
        );
        let mut twice = SoftwareSurface::from_image(&white);
        for _ in 0..2 {
            twice.stroke_segment(
                (0.0, 4.0),
                (8.0, 4.0),
                4.0,
                Color::YELLOW,
                0.45,
                Composite::Multiply,
            );
        }
        assert!(twice.pixel(4, 4).2 < once.pixel(4, 4).2);
    }

    #[test]
    fn test_clear_restores_base_image() {
        let white = RgbaImage::from_pixel(4, 4, image::Rgba([255, 255, 255, 255]));
        let mut surface = SoftwareSurface::from_image(&white);
        surface.stroke_segment(
            (0.0, 2.0),
            (4.0, 2.0),
            4.0,
            Color::BLACK,
            1.0,
            Composite::SourceOver,
        );
        assert_ne!(surface.pixel(2, 2), (255, 255, 255, 255));
        surface.clear();
        assert_eq!(surface.pixel(2, 2), (255, 255, 255, 255));
    }

    #[test]
    fn test_clear_restores_transparency() {
        let mut surface = SoftwareSurface::new(4, 4);
        surface.stroke_segment(
            (0.0, 2.0),
            (4.0, 2.0),
            4.0,
            Color::RED,
            1.0,
            Composite::SourceOver,
        );
        surface.clear();
        assert_eq!(surface.pixel(2, 2), (0, 0, 0, 0));
    }
}
