// core-draw/src/font.rs

//! The font cache and the fallback text seam.
//!
//! A font is a glyph-metrics table keyed by the id of its backing
//! image; the glyph rasters themselves live inside that image. The
//! server owns the cache policy entirely: it replaces slots with
//! `loadchar` whenever it likes, and the core never evicts on its own.
//!
//! When a font has no usable glyphs at all, string drawing falls back
//! to a pluggable [`TextDriver`]. The default driver is headless and
//! inks nothing; embedding hosts supply one backed by the platform's
//! text API, tests supply a deterministic mock.

use crate::error::{DrawError, Result};
use draw_gfx::{Point, Rect, Surface};
use log::{debug, trace};
use std::collections::HashMap;

/// Hard cap on the glyph table: indices are 16-bit on the wire.
const MAX_GLYPHS: u32 = 1 << 16;

/// Metrics for one cache slot.
///
/// `x` is the glyph's left edge inside the font's backing image; the
/// right edge is the next slot's `x` (the table carries a sentinel entry
/// at the end for exactly this). `top`/`bottom` bound the inked rows,
/// `left` offsets the pen before drawing, `width` advances it after.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphMetric {
    pub x: u16,
    pub top: u8,
    pub bottom: u8,
    pub left: i8,
    pub width: u8,
}

/// One font: ascent, running height and the slot table.
#[derive(Debug, Clone)]
pub struct Font {
    pub ascent: i32,
    /// Starts at `ascent` and grows to the deepest loaded glyph.
    pub height: i32,
    glyphs: Vec<GlyphMetric>,
}

impl Font {
    fn new(n: u32, ascent: i32) -> Result<Self> {
        if n >= MAX_GLYPHS {
            return Err(DrawError::AllocationFailure(format!(
                "glyph table of {n} slots exceeds the 16-bit index space"
            )));
        }
        Ok(Font {
            ascent,
            height: ascent,
            glyphs: vec![GlyphMetric::default(); n as usize + 1],
        })
    }

    /// Slot count, excluding the sentinel.
    #[must_use]
    pub fn n(&self) -> usize {
        self.glyphs.len() - 1
    }

    /// Installs a glyph's metrics and maintains the sentinel.
    pub fn load_char(&mut self, index: usize, r: Rect, left: i8, width: u8) -> Result<()> {
        if index >= self.n() {
            return Err(DrawError::OutOfRange(format!(
                "glyph index {index} not below {}",
                self.n()
            )));
        }
        let fits = u16::try_from(r.min.x).is_ok()
            && u16::try_from(r.max.x).is_ok()
            && u8::try_from(r.min.y).is_ok()
            && u8::try_from(r.max.y).is_ok();
        if !fits {
            return Err(DrawError::OutOfRange(format!(
                "glyph rectangle {r:?} exceeds the metric range"
            )));
        }
        self.glyphs[index] = GlyphMetric {
            x: r.min.x as u16,
            top: r.min.y as u8,
            bottom: r.max.y as u8,
            left,
            width,
        };
        self.glyphs[index + 1].x = r.max.x as u16;
        self.height = self.height.max(r.max.y);
        trace!("glyph {index} loaded at {r:?}, font height now {}", self.height);
        Ok(())
    }

    #[must_use]
    pub fn metric(&self, index: usize) -> Option<&GlyphMetric> {
        if index < self.n() {
            self.glyphs.get(index)
        } else {
            None
        }
    }

    /// The glyph's source rectangle inside the backing image, or `None`
    /// for an empty slot (zero advance or collapsed span).
    #[must_use]
    pub fn glyph_rect(&self, index: usize) -> Option<Rect> {
        let g = self.metric(index)?;
        let next_x = self.glyphs[index + 1].x;
        if g.width == 0 || next_x <= g.x {
            return None;
        }
        Some(Rect::new(
            g.x as i32,
            g.top as i32,
            next_x as i32,
            g.bottom as i32,
        ))
    }

    /// False when every slot is empty, which routes string drawing to
    /// the fallback driver.
    #[must_use]
    pub fn has_renderable_glyph(&self) -> bool {
        (0..self.n()).any(|i| self.glyph_rect(i).is_some())
    }
}

/// Fonts keyed by backing-image id.
#[derive(Debug, Default)]
pub struct FontStore {
    fonts: HashMap<i32, Font>,
}

impl FontStore {
    #[must_use]
    pub fn new() -> Self {
        FontStore::default()
    }

    /// Creates (or resets) the glyph table for `image_id`.
    pub fn init_font(&mut self, image_id: i32, n: u32, ascent: i32) -> Result<()> {
        self.fonts.insert(image_id, Font::new(n, ascent)?);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, image_id: i32) -> Option<&Font> {
        self.fonts.get(&image_id)
    }

    pub fn get_mut(&mut self, image_id: i32) -> Option<&mut Font> {
        self.fonts.get_mut(&image_id)
    }

    /// Fonts never outlive their backing image.
    pub fn drop_for_image(&mut self, image_id: i32) {
        if self.fonts.remove(&image_id).is_some() {
            debug!("font for image {image_id} dropped with its image");
        }
    }
}

/// The pluggable fallback text renderer.
///
/// `pen` is in surface-local coordinates and sits on the baseline; the
/// driver returns the pen after drawing. Implementations render `text`
/// at `font_height` in `family`, inked with `color`.
pub trait TextDriver {
    fn draw_text(
        &self,
        surface: &mut Surface,
        pen: Point,
        text: &str,
        color: [u8; 4],
        font_height: u32,
        family: &str,
    ) -> anyhow::Result<Point>;
}

/// The default driver: no platform text API, so it inks nothing and
/// advances the pen at half the font height per character.
#[derive(Debug, Clone, Default)]
pub struct HeadlessTextDriver;

impl TextDriver for HeadlessTextDriver {
    fn draw_text(
        &self,
        _surface: &mut Surface,
        pen: Point,
        text: &str,
        _color: [u8; 4],
        font_height: u32,
        _family: &str,
    ) -> anyhow::Result<Point> {
        let advance = (font_height / 2).max(1) as i32;
        let n = text.chars().count() as i32;
        Ok(Point::new(pen.x + advance * n, pen.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn init_builds_a_zeroed_table_with_sentinel() {
        let mut fonts = FontStore::new();
        fonts.init_font(5, 2, 8).unwrap();
        let f = fonts.get(5).unwrap();
        assert_eq!(f.n(), 2);
        assert_eq!(f.height, 8);
        assert!(!f.has_renderable_glyph());
        assert_eq!(f.glyph_rect(0), None);
    }

    #[test]
    fn load_char_sets_metrics_and_grows_height() {
        let mut font = Font::new(2, 8).unwrap();
        font.load_char(0, Rect::new(0, 0, 4, 10), 1, 4).unwrap();
        assert_eq!(font.height, 10);
        assert_eq!(font.glyph_rect(0), Some(Rect::new(0, 0, 4, 10)));
        let m = font.metric(0).unwrap();
        assert_eq!((m.left, m.width), (1, 4));
    }

    #[test]
    fn sentinel_supplies_the_right_edge() {
        let mut font = Font::new(2, 8).unwrap();
        font.load_char(0, Rect::new(0, 0, 4, 8), 0, 4).unwrap();
        font.load_char(1, Rect::new(4, 0, 9, 8), 0, 5).unwrap();
        // Slot 0's right edge was overwritten by slot 1's load.
        assert_eq!(font.glyph_rect(0), Some(Rect::new(0, 0, 4, 8)));
        assert_eq!(font.glyph_rect(1), Some(Rect::new(4, 0, 9, 8)));
    }

    #[test]
    fn collapsed_or_zero_width_slots_are_empty() {
        let mut font = Font::new(2, 8).unwrap();
        font.load_char(0, Rect::new(6, 0, 6, 8), 0, 3).unwrap();
        assert_eq!(font.glyph_rect(0), None, "collapsed span");
        font.load_char(1, Rect::new(0, 0, 4, 8), 0, 0).unwrap();
        assert_eq!(font.glyph_rect(1), None, "zero advance");
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let mut font = Font::new(1, 8).unwrap();
        let err = font.load_char(1, Rect::new(0, 0, 1, 1), 0, 1).unwrap_err();
        assert!(matches!(err, DrawError::OutOfRange(_)));
    }

    #[test]
    fn oversized_table_is_an_allocation_failure() {
        assert!(matches!(
            Font::new(1 << 16, 8),
            Err(DrawError::AllocationFailure(_))
        ));
    }

    #[test]
    fn dropping_the_image_drops_the_font() {
        let mut fonts = FontStore::new();
        fonts.init_font(5, 1, 8).unwrap();
        fonts.drop_for_image(5);
        assert!(fonts.get(5).is_none());
    }

    #[test]
    fn headless_driver_advances_without_ink() {
        let driver = HeadlessTextDriver;
        let mut surface = Surface::new(4, 4);
        let end = driver
            .draw_text(&mut surface, Point::new(0, 8), "ab", [255; 4], 16, "monospace")
            .unwrap();
        assert_eq!(end, Point::new(16, 8));
        assert_eq!(surface.get(0, 0), [0, 0, 0, 0]);
    }
}
