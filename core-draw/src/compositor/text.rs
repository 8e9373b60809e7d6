// core-draw/src/compositor/text.rs

// String commands: cached-glyph rendering and the fallback path. The
// Compositor struct lives in mod.rs.

use super::Compositor;
use crate::error::{DrawError, Result};
use crate::wire::{WireReader, WireWriter};
use draw_gfx::surface::MaskSource;
use draw_gfx::{Point, Rect};
use log::{trace, warn};

impl Compositor {
    /// `s` / `x`: draws glyphs by cache index and responds with the end
    /// pen point. The `x` form first fills the string's cell with a
    /// background colour.
    pub(super) fn cmd_string(
        &mut self,
        reader: &mut WireReader,
        with_bg: bool,
        response: &mut WireWriter,
    ) -> Result<()> {
        let dst_id = reader.long()?;
        let src_id = reader.long()?;
        let font_id = reader.long()?;
        let p = reader.point()?;
        let clipr = reader.rect()?;
        let sp = reader.point()?;
        let n = reader.short()? as usize;
        let bg = if with_bg {
            Some((reader.long()?, reader.point()?))
        } else {
            None
        };
        let mut indices = Vec::with_capacity(n);
        for _ in 0..n {
            indices.push(reader.short()?);
        }

        let op = self.take_op();

        // A font needs either a glyph table or at least a live image to
        // hang the fallback off; neither means the id is simply unknown.
        let have_table = self.fonts.get(font_id).is_some();
        if !have_table && self.store.lookup(font_id).is_err() {
            return Err(DrawError::UnknownFont(font_id));
        }
        let renderable = self
            .fonts
            .get(font_id)
            .map(crate::font::Font::has_renderable_glyph)
            .unwrap_or(false);

        let end = if renderable {
            self.draw_cached_string(dst_id, src_id, font_id, p, clipr, sp, bg, &indices, op)?
        } else {
            self.draw_fallback_string(dst_id, src_id, font_id, p, sp, &indices)?
        };
        response.point(end);
        Ok(())
    }

    /// The cached path: each index names a slot in the font's table;
    /// its raster inside the font image masks the source colour onto
    /// the destination.
    #[allow(clippy::too_many_arguments)]
    fn draw_cached_string(
        &mut self,
        dst_id: i32,
        src_id: i32,
        font_id: i32,
        p: Point,
        clipr: Rect,
        sp: Point,
        bg: Option<(i32, Point)>,
        indices: &[u16],
        op: draw_gfx::DrawOp,
    ) -> Result<Point> {
        // Plan the run before touching pixels so an out-of-range index
        // aborts without a half-drawn background.
        let (font_ascent, font_height, glyphs) = {
            let font = self
                .fonts
                .get(font_id)
                .ok_or(DrawError::UnknownFont(font_id))?;
            let mut glyphs = Vec::with_capacity(indices.len());
            for &index in indices {
                let index = index as usize;
                let metric = *font.metric(index).ok_or_else(|| {
                    DrawError::OutOfRange(format!(
                        "glyph index {index} not below {}",
                        font.n()
                    ))
                })?;
                glyphs.push((font.glyph_rect(index), metric));
            }
            (font.ascent, font.height, glyphs)
        };

        let total_advance: i32 = glyphs
            .iter()
            .filter(|(rect, _)| rect.is_some())
            .map(|(_, m)| m.width as i32)
            .sum();

        let mut touched = Rect::ZERO;

        if let Some((bg_id, bgp)) = bg {
            let bg_color = self.sample_color(bg_id, bgp)?;
            let cell = Rect::new(
                p.x,
                p.y - font_ascent,
                p.x + total_advance,
                p.y - font_ascent + font_height,
            );
            let img = self.store.lookup_mut(dst_id)?;
            let clipped = img.draw_bounds().intersect(&clipr).intersect(&cell);
            if !clipped.is_empty() {
                let local = clipped.translate(Point::ZERO - img.r.min);
                img.surface.fill_rect(local, bg_color, op);
                touched = touched.union(&clipped);
            }
        }

        let font_view = self.snapshot(font_id)?;
        let src = self.snapshot(src_id)?;

        let img = self.store.lookup_mut(dst_id)?;
        let bounds = img.draw_bounds().intersect(&clipr);
        let mut pen_x = p.x;
        for (glyph_rect, metric) in glyphs {
            let Some(glyph_src) = glyph_rect else {
                // Empty slot: skip without advancing.
                trace!("empty glyph slot skipped");
                continue;
            };
            let dst_min = Point::new(pen_x + metric.left as i32, p.y - font_ascent + metric.top as i32);
            let dst_r = Rect::from_points(
                dst_min,
                dst_min + Point::new(glyph_src.width(), glyph_src.height()),
            );
            let clipped = bounds.intersect(&dst_r);
            if !clipped.is_empty() {
                let local = clipped.translate(Point::ZERO - img.r.min);
                // The glyph raster gates the source colour per pixel.
                let mask = MaskSource {
                    surf: &font_view.surface,
                    off: clipped.min - dst_r.min + glyph_src.min - font_view.r.min,
                    repl: false,
                    use_alpha: font_view.has_alpha,
                };
                let src_off = clipped.min - p + sp - src.r.min;
                img.surface
                    .composite(local, &src.surface, src_off, src.repl, Some(mask), op);
                touched = touched.union(&clipped);
            }
            pen_x += metric.width as i32;
        }

        self.add_refresh(dst_id, touched);
        Ok(Point::new(pen_x, p.y))
    }

    /// The fallback path: no usable glyphs, so the indices are Unicode
    /// code points for the pluggable text driver.
    fn draw_fallback_string(
        &mut self,
        dst_id: i32,
        src_id: i32,
        font_id: i32,
        p: Point,
        sp: Point,
        indices: &[u16],
    ) -> Result<Point> {
        let text: String = indices
            .iter()
            .map(|&i| char::from_u32(i as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
        let height = self
            .fonts
            .get(font_id)
            .map(|f| f.height.max(1) as u32)
            .unwrap_or(self.config.fallback_font_height.max(1));
        let color = self.sample_color(src_id, sp)?;
        let family = self.config.font_family.clone();

        let img = self.store.lookup_mut(dst_id)?;
        let local_pen = img.to_local(p);
        let local_end = match self
            .driver
            .draw_text(&mut img.surface, local_pen, &text, color, height, &family)
        {
            Ok(end) => end,
            Err(e) => {
                warn!("fallback text driver failed: {e:#}");
                local_pen
            }
        };
        let end = local_end + img.r.min;

        let touched = Rect::new(p.x, p.y - height as i32, end.x, p.y + 1);
        self.add_refresh(dst_id, touched);
        Ok(end)
    }
}
