// draw-gfx/src/surface.rs

//! The concrete pixel buffer behind every image.
//!
//! One type serves the visible display and offscreen images alike; the
//! store, not the surface, knows which is which. Pixels are straight
//! RGBA8, row-major. Surface coordinates are local: `(0, 0)` is the
//! buffer's top-left regardless of the owning image's rectangle, and
//! the caller translates global draw coordinates before touching the
//! buffer.

use crate::compose::{compose, DrawOp};
use crate::geom::{Point, Rect};

/// A rectangular straight-RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// A mask input to `composite`: coverage is read from the alpha channel
/// when the mask's format carries one, from the grey (red) channel
/// otherwise.
#[derive(Debug, Clone, Copy)]
pub struct MaskSource<'a> {
    pub surf: &'a Surface,
    /// Mask-local position corresponding to the destination rect's min.
    pub off: Point,
    pub repl: bool,
    pub use_alpha: bool,
}

impl Surface {
    /// Allocates a transparent-black surface.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Surface {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Local bounds as a rect.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::with_extent(self.width as i32, self.height as i32)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    #[inline]
    pub fn put(&mut self, x: u32, y: u32, px: [u8; 4]) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&px);
    }

    /// Reads a pixel at signed coordinates. Replicated surfaces wrap
    /// modulo their extent; otherwise out-of-bounds reads are
    /// transparent black.
    #[inline]
    #[must_use]
    pub fn sample(&self, x: i64, y: i64, repl: bool) -> [u8; 4] {
        if self.width == 0 || self.height == 0 {
            return [0, 0, 0, 0];
        }
        let (x, y) = if repl {
            (
                x.rem_euclid(self.width as i64),
                y.rem_euclid(self.height as i64),
            )
        } else {
            if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
                return [0, 0, 0, 0];
            }
            (x, y)
        };
        self.get(x as u32, y as u32)
    }

    /// One row of raw RGBA bytes.
    #[inline]
    #[must_use]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.width as usize * 4;
        &self.data[start..start + self.width as usize * 4]
    }

    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.width as usize * 4;
        let end = start + self.width as usize * 4;
        &mut self.data[start..end]
    }

    /// Fills `r` (clipped to the buffer) with `color` through `op`.
    pub fn fill_rect(&mut self, r: Rect, color: [u8; 4], op: DrawOp) {
        let r = r.intersect(&self.bounds());
        if r.is_empty() {
            return;
        }
        let opaque_over = op == DrawOp::SoverD && color[3] == 255;
        if op == DrawOp::S || opaque_over {
            for y in r.min.y..r.max.y {
                let row = self.row_mut(y as u32);
                for px in row[(r.min.x as usize * 4)..(r.max.x as usize * 4)].chunks_exact_mut(4) {
                    px.copy_from_slice(&color);
                }
            }
            return;
        }
        for y in r.min.y..r.max.y {
            for x in r.min.x..r.max.x {
                let dst = self.get(x as u32, y as u32);
                self.put(x as u32, y as u32, compose(op, color, 255, dst));
            }
        }
    }

    /// The general blit. For every destination pixel in `dst_r` (local,
    /// clipped to the buffer), the source is read at the same offset
    /// from `src_off`, the mask coverage likewise from its own offset,
    /// and the three meet under `op`.
    pub fn composite(
        &mut self,
        dst_r: Rect,
        src: &Surface,
        src_off: Point,
        src_repl: bool,
        mask: Option<MaskSource<'_>>,
        op: DrawOp,
    ) {
        let dst_r = dst_r.intersect(&self.bounds());
        if dst_r.is_empty() {
            return;
        }
        for y in dst_r.min.y..dst_r.max.y {
            let dy = (y - dst_r.min.y) as i64;
            for x in dst_r.min.x..dst_r.max.x {
                let dx = (x - dst_r.min.x) as i64;
                let s = src.sample(src_off.x as i64 + dx, src_off.y as i64 + dy, src_repl);
                let cover = match &mask {
                    None => 255,
                    Some(m) => {
                        let mp = m
                            .surf
                            .sample(m.off.x as i64 + dx, m.off.y as i64 + dy, m.repl);
                        if m.use_alpha {
                            mp[3]
                        } else {
                            mp[0]
                        }
                    }
                };
                let dst = self.get(x as u32, y as u32);
                self.put(x as u32, y as u32, compose(op, s, cover, dst));
            }
        }
    }

    /// Returns a copy resized to the new extent, preserving the
    /// top-left overlap. New area is transparent black.
    #[must_use]
    pub fn resized(&self, width: u32, height: u32) -> Surface {
        let mut out = Surface::new(width, height);
        let copy_w = (self.width.min(width)) as usize * 4;
        for y in 0..self.height.min(height) {
            out.row_mut(y)[..copy_w].copy_from_slice(&self.row(y)[..copy_w]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> Surface {
        let mut s = Surface::new(w, h);
        s.fill_rect(s.bounds(), px, DrawOp::S);
        s
    }

    #[test]
    fn fill_respects_clipping_to_bounds() {
        let mut s = Surface::new(4, 4);
        s.fill_rect(Rect::new(-2, -2, 2, 2), [9, 9, 9, 255], DrawOp::S);
        assert_eq!(s.get(0, 0), [9, 9, 9, 255]);
        assert_eq!(s.get(1, 1), [9, 9, 9, 255]);
        assert_eq!(s.get(2, 2), [0, 0, 0, 0]);
    }

    #[test]
    fn sample_wraps_when_replicated() {
        let mut s = Surface::new(2, 2);
        s.put(1, 1, [5, 6, 7, 255]);
        assert_eq!(s.sample(3, 3, true), [5, 6, 7, 255]);
        assert_eq!(s.sample(-1, -1, true), [5, 6, 7, 255]);
        assert_eq!(s.sample(3, 3, false), [0, 0, 0, 0]);
    }

    #[test]
    fn composite_tiles_a_replicated_source() {
        let mut pattern = Surface::new(2, 2);
        pattern.put(0, 0, [1, 0, 0, 255]);
        pattern.put(1, 0, [2, 0, 0, 255]);
        pattern.put(0, 1, [3, 0, 0, 255]);
        pattern.put(1, 1, [4, 0, 0, 255]);

        let mut dst = Surface::new(5, 5);
        dst.composite(
            dst.bounds(),
            &pattern,
            Point::ZERO,
            true,
            None,
            DrawOp::SoverD,
        );
        // (3, 1) lands on pattern pixel (1, 1).
        assert_eq!(dst.get(3, 1), [4, 0, 0, 255]);
        assert_eq!(dst.get(4, 4), [1, 0, 0, 255]);
    }

    #[test]
    fn composite_with_opaque_mask_equals_unmasked() {
        let src = solid(3, 3, [10, 20, 30, 255]);
        let mask = solid(1, 1, [255, 255, 255, 255]);

        let mut with_mask = Surface::new(3, 3);
        with_mask.composite(
            with_mask.bounds(),
            &src,
            Point::ZERO,
            false,
            Some(MaskSource {
                surf: &mask,
                off: Point::ZERO,
                repl: true,
                use_alpha: true,
            }),
            DrawOp::SoverD,
        );

        let mut without = Surface::new(3, 3);
        without.composite(without.bounds(), &src, Point::ZERO, false, None, DrawOp::SoverD);
        assert_eq!(with_mask, without);
    }

    #[test]
    fn greyscale_mask_reads_coverage_from_grey() {
        let src = solid(1, 1, [200, 0, 0, 255]);
        // Grey 0 as converted from k8: (0,0,0,255). Coverage must be 0.
        let mask = solid(1, 1, [0, 0, 0, 255]);
        let mut dst = solid(1, 1, [0, 0, 200, 255]);
        dst.composite(
            dst.bounds(),
            &src,
            Point::ZERO,
            true,
            Some(MaskSource {
                surf: &mask,
                off: Point::ZERO,
                repl: true,
                use_alpha: false,
            }),
            DrawOp::SoverD,
        );
        assert_eq!(dst.get(0, 0), [0, 0, 200, 255]);
    }

    #[test]
    fn out_of_bounds_source_reads_transparent() {
        let src = solid(1, 1, [50, 50, 50, 255]);
        let mut dst = solid(2, 1, [7, 7, 7, 255]);
        // Source offset walks off the 1x1 source for x = 1.
        dst.composite(dst.bounds(), &src, Point::ZERO, false, None, DrawOp::SoverD);
        assert_eq!(dst.get(0, 0), [50, 50, 50, 255]);
        assert_eq!(dst.get(1, 0), [7, 7, 7, 255]);
    }

    #[test]
    fn resized_preserves_overlap() {
        let mut s = Surface::new(3, 3);
        s.put(2, 2, [1, 2, 3, 4]);
        s.put(0, 0, [9, 8, 7, 6]);
        let grown = s.resized(5, 5);
        assert_eq!(grown.get(0, 0), [9, 8, 7, 6]);
        assert_eq!(grown.get(2, 2), [1, 2, 3, 4]);
        assert_eq!(grown.get(4, 4), [0, 0, 0, 0]);
        let shrunk = s.resized(2, 2);
        assert_eq!(shrunk.get(0, 0), [9, 8, 7, 6]);
    }
}
