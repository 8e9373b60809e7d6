// core-draw/src/compositor/ops.rs

// Geometry commands: blit, line, ellipse, arc, polygon. The Compositor
// struct lives in mod.rs; this file carries the drawing half of its
// impl, plus the pixel-level rasterizers they share.

use super::Compositor;
use crate::error::Result;
use crate::store::Image;
use crate::wire::WireReader;
use draw_gfx::compose::compose;
use draw_gfx::surface::MaskSource;
use draw_gfx::{DrawOp, Point, Rect};

// Endcap selectors, low five bits of the end0/end1 parameters.
const ENDCAP_MASK: i32 = 0x1F;
const END_SQUARE: i32 = 0;

impl Compositor {
    /// `d`: the general blit. Source and mask snapshots are taken
    /// before the destination borrow so aliased blits stay defined.
    pub(super) fn cmd_draw(&mut self, reader: &mut WireReader) -> Result<()> {
        let dst_id = reader.long()?;
        let src_id = reader.long()?;
        let mask_id = reader.long()?;
        let r = reader.rect()?;
        let sp = reader.point()?;
        let mp = reader.point()?;

        let src = self.snapshot(src_id)?;
        let mask = if mask_id != 0 {
            Some(self.snapshot(mask_id)?)
        } else {
            None
        };
        let op = self.take_op();

        let img = self.store.lookup_mut(dst_id)?;
        let clipped = img.draw_bounds().intersect(&r);
        if clipped.is_empty() {
            return Ok(());
        }

        let dst_local = clipped.translate(Point::ZERO - img.r.min);
        let src_off = clipped.min - r.min + sp - src.r.min;
        let mask_view = mask.as_ref().map(|m| MaskSource {
            surf: &m.surface,
            off: clipped.min - r.min + mp - m.r.min,
            repl: m.repl,
            use_alpha: m.has_alpha,
        });
        img.surface
            .composite(dst_local, &src.surface, src_off, src.repl, mask_view, op);

        self.add_refresh(dst_id, clipped);
        Ok(())
    }

    /// `L`: stroked line with endcaps.
    pub(super) fn cmd_line(&mut self, reader: &mut WireReader) -> Result<()> {
        let dst_id = reader.long()?;
        let p0 = reader.point()?;
        let p1 = reader.point()?;
        let end0 = reader.long()?;
        let end1 = reader.long()?;
        let radius = reader.long()?;
        let src_id = reader.long()?;
        let sp = reader.point()?;

        let color = self.sample_color(src_id, sp)?;
        let op = self.take_op();
        let img = self.store.lookup_mut(dst_id)?;
        let touched = stroke_line(img, p0, p1, end0, end1, radius, color, op);
        self.add_refresh(dst_id, touched);
        Ok(())
    }

    /// `e` / `E`: ellipse outline or filled ellipse. The trailing
    /// alpha/phi parameters are present but unused for full ellipses.
    pub(super) fn cmd_ellipse(&mut self, reader: &mut WireReader, fill_opcode: bool) -> Result<()> {
        let (dst_id, c, a, b, thick, color, _alpha, _phi) = self.read_ellipse_params(reader)?;
        let op = self.take_op();
        let filled = fill_opcode || thick < 0;
        let img = self.store.lookup_mut(dst_id)?;
        let touched = paint_ellipse(img, c, a, b, thick, filled, None, color, op);
        self.add_refresh(dst_id, touched);
        Ok(())
    }

    /// `a`: elliptical arc. `alpha` is the extent and `phi` the start
    /// angle, both in 64ths of a degree; positive extent sweeps
    /// counter-clockwise. Negative thickness fills the pie slice.
    pub(super) fn cmd_arc(&mut self, reader: &mut WireReader) -> Result<()> {
        let (dst_id, c, a, b, thick, color, alpha, phi) = self.read_ellipse_params(reader)?;
        let op = self.take_op();
        let filled = thick < 0;
        let img = self.store.lookup_mut(dst_id)?;
        let sweep = ArcSweep {
            start: phi as f64 / 64.0,
            extent: alpha as f64 / 64.0,
        };
        let touched = paint_ellipse(img, c, a, b, thick, filled, Some(sweep), color, op);
        self.add_refresh(dst_id, touched);
        Ok(())
    }

    /// `p`: open polygon, stroked segment by segment. Interior joints
    /// take disc caps; the command's endcaps apply to the free ends.
    pub(super) fn cmd_poly(&mut self, reader: &mut WireReader) -> Result<()> {
        let dst_id = reader.long()?;
        let n = reader.short()? as usize;
        let end0 = reader.long()?;
        let end1 = reader.long()?;
        let radius = reader.long()?;
        let src_id = reader.long()?;
        let sp = reader.point()?;
        let points = reader.delta_points(n + 1)?;

        let color = self.sample_color(src_id, sp)?;
        let op = self.take_op();
        let img = self.store.lookup_mut(dst_id)?;
        let mut touched = Rect::ZERO;
        for (i, seg) in points.windows(2).enumerate() {
            let cap0 = if i == 0 { end0 } else { 1 };
            let cap1 = if i == points.len() - 2 { end1 } else { 1 };
            let r = stroke_line(img, seg[0], seg[1], cap0, cap1, radius, color, op);
            touched = touched.union(&r);
        }
        self.add_refresh(dst_id, touched);
        Ok(())
    }

    /// `P`: filled polygon. `wind` zero selects even-odd fill,
    /// anything else non-zero winding.
    pub(super) fn cmd_fill_poly(&mut self, reader: &mut WireReader) -> Result<()> {
        let dst_id = reader.long()?;
        let n = reader.short()? as usize;
        let wind = reader.long()?;
        let _ignore0 = reader.long()?;
        let _ignore1 = reader.long()?;
        let src_id = reader.long()?;
        let sp = reader.point()?;
        let points = reader.delta_points(n + 1)?;

        let color = self.sample_color(src_id, sp)?;
        let op = self.take_op();
        let img = self.store.lookup_mut(dst_id)?;
        let touched = fill_polygon(img, &points, wind != 0, color, op);
        self.add_refresh(dst_id, touched);
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn read_ellipse_params(
        &mut self,
        reader: &mut WireReader,
    ) -> Result<(i32, Point, i32, i32, i32, [u8; 4], i32, i32)> {
        let dst_id = reader.long()?;
        let src_id = reader.long()?;
        let c = reader.point()?;
        let a = reader.long()?;
        let b = reader.long()?;
        let thick = reader.long()?;
        let sp = reader.point()?;
        let alpha = reader.long()?;
        let phi = reader.long()?;
        let color = self.sample_color(src_id, sp)?;
        Ok((dst_id, c, a, b, thick, color, alpha, phi))
    }
}

// --- Pixel-level rasterizers -----------------------------------------------

/// Composes `color` into one pixel if it falls inside `bounds`.
#[inline]
fn plot(img: &mut Image, bounds: &Rect, x: i32, y: i32, color: [u8; 4], op: DrawOp) {
    if !bounds.contains(Point::new(x, y)) {
        return;
    }
    let lx = (x - img.r.min.x) as u32;
    let ly = (y - img.r.min.y) as u32;
    let dst = img.surface.get(lx, ly);
    img.surface.put(lx, ly, compose(op, color, 255, dst));
}

/// Single-pixel Bresenham line, used for zero-radius strokes.
fn bresenham(img: &mut Image, bounds: &Rect, p0: Point, p1: Point, color: [u8; 4], op: DrawOp) {
    let dx = (p1.x - p0.x).abs();
    let dy = -(p1.y - p0.y).abs();
    let sx = if p0.x < p1.x { 1 } else { -1 };
    let sy = if p0.y < p1.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (p0.x, p0.y);
    loop {
        plot(img, bounds, x, y, color, op);
        if x == p1.x && y == p1.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            if x == p1.x {
                break;
            }
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            if y == p1.y {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Strokes a segment with width `max(1, 2 * radius)` and the given
/// endcaps (0 square, 1 disc, 2 arrow drawn as disc). Returns the
/// touched bounding box in global coordinates.
#[allow(clippy::too_many_arguments)]
pub(super) fn stroke_line(
    img: &mut Image,
    p0: Point,
    p1: Point,
    end0: i32,
    end1: i32,
    radius: i32,
    color: [u8; 4],
    op: DrawOp,
) -> Rect {
    let bounds = img.draw_bounds();
    if bounds.is_empty() {
        return Rect::ZERO;
    }

    if radius <= 0 {
        bresenham(img, &bounds, p0, p1, color, op);
        let bbox = Rect::new(
            p0.x.min(p1.x),
            p0.y.min(p1.y),
            p0.x.max(p1.x) + 1,
            p0.y.max(p1.y) + 1,
        );
        return bbox.intersect(&bounds);
    }

    let cap0 = end0 & ENDCAP_MASK;
    let cap1 = end1 & ENDCAP_MASK;
    let half = radius as f64;
    let pad = radius + 1;
    let bbox = Rect::new(
        p0.x.min(p1.x) - pad,
        p0.y.min(p1.y) - pad,
        p0.x.max(p1.x) + pad + 1,
        p0.y.max(p1.y) + pad + 1,
    )
    .intersect(&bounds);

    let (ax, ay) = (p0.x as f64, p0.y as f64);
    let vx = (p1.x - p0.x) as f64;
    let vy = (p1.y - p0.y) as f64;
    let len2 = vx * vx + vy * vy;

    for y in bbox.min.y..bbox.max.y {
        for x in bbox.min.x..bbox.max.x {
            // Pixel centers sit half a unit in from the grid corner.
            let px = x as f64 + 0.5;
            let py = y as f64 + 0.5;
            let inside = if len2 == 0.0 {
                // Degenerate segment: both caps govern.
                let keep = cap0 != END_SQUARE || cap1 != END_SQUARE;
                keep && ((px - ax).powi(2) + (py - ay).powi(2)).sqrt() < half
            } else {
                let t = ((px - ax) * vx + (py - ay) * vy) / len2;
                if t < 0.0 {
                    cap0 != END_SQUARE
                        && ((px - ax).powi(2) + (py - ay).powi(2)).sqrt() < half
                } else if t > 1.0 {
                    cap1 != END_SQUARE
                        && ((px - p1.x as f64).powi(2) + (py - p1.y as f64).powi(2)).sqrt() < half
                } else {
                    let cx = ax + t * vx;
                    let cy = ay + t * vy;
                    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt() < half
                }
            };
            if inside {
                plot(img, &bounds, x, y, color, op);
            }
        }
    }
    bbox
}

/// Arc gating: which part of the ellipse's sweep is inked.
#[derive(Debug, Clone, Copy)]
pub(super) struct ArcSweep {
    /// Start angle in degrees.
    pub start: f64,
    /// Extent in degrees; positive sweeps counter-clockwise.
    pub extent: f64,
}

impl ArcSweep {
    fn includes(&self, dx: f64, dy: f64) -> bool {
        if self.extent.abs() >= 360.0 {
            return true;
        }
        // The surface's y axis points down; flip it so protocol angles
        // stay counter-clockwise-positive.
        let theta = (-dy).atan2(dx).to_degrees().rem_euclid(360.0);
        if self.extent >= 0.0 {
            (theta - self.start).rem_euclid(360.0) <= self.extent
        } else {
            (self.start - theta).rem_euclid(360.0) <= -self.extent
        }
    }
}

/// Paints an ellipse, annulus or arc around centre `c` with radii
/// `a`/`b`. Outline thickness is `thick` extra pixels each way;
/// `filled` ignores the inner edge. Returns the touched bounding box.
#[allow(clippy::too_many_arguments)]
pub(super) fn paint_ellipse(
    img: &mut Image,
    c: Point,
    a: i32,
    b: i32,
    thick: i32,
    filled: bool,
    sweep: Option<ArcSweep>,
    color: [u8; 4],
    op: DrawOp,
) -> Rect {
    let bounds = img.draw_bounds();
    if bounds.is_empty() || a < 0 || b < 0 {
        return Rect::ZERO;
    }
    let t = thick.max(0);
    let pad = t + 1;
    let bbox = Rect::new(
        c.x - a - pad,
        c.y - b - pad,
        c.x + a + pad + 1,
        c.y + b + pad + 1,
    )
    .intersect(&bounds);

    let outer_a = (a + t) as f64 + 0.5;
    let outer_b = (b + t) as f64 + 0.5;
    let inner_a = (a - t) as f64 - 0.5;
    let inner_b = (b - t) as f64 - 0.5;
    let has_hole = !filled && inner_a > 0.0 && inner_b > 0.0;

    for y in bbox.min.y..bbox.max.y {
        for x in bbox.min.x..bbox.max.x {
            let dx = (x - c.x) as f64;
            let dy = (y - c.y) as f64;
            let outer = (dx / outer_a).powi(2) + (dy / outer_b).powi(2) <= 1.0;
            if !outer {
                continue;
            }
            if has_hole && (dx / inner_a).powi(2) + (dy / inner_b).powi(2) < 1.0 {
                continue;
            }
            if let Some(s) = sweep {
                if !s.includes(dx, dy) {
                    continue;
                }
            }
            plot(img, &bounds, x, y, color, op);
        }
    }
    bbox
}

/// Winding number and crossing parity of the pixel centre
/// `(x + 0.5, y + 0.5)` against a closed polygon, via a ray toward +x.
/// Vertices sit on integer coordinates, so the half-unit offset keeps
/// the ray clear of them.
fn winding_at(points: &[Point], x: i32, y: i32) -> (i32, bool) {
    let cx = x as f64 + 0.5;
    let cy = y as f64 + 0.5;
    let mut winding = 0i32;
    let mut crossings = 0u32;
    let n = points.len();
    for i in 0..n {
        let p0 = points[i];
        let p1 = points[(i + 1) % n];
        if p0.y == p1.y {
            continue;
        }
        let (ymin, ymax, dir) = if p1.y > p0.y {
            (p0.y, p1.y, 1)
        } else {
            (p1.y, p0.y, -1)
        };
        if cy < ymin as f64 || cy >= ymax as f64 {
            continue;
        }
        let t = (cy - p0.y as f64) / (p1.y - p0.y) as f64;
        let edge_x = p0.x as f64 + t * (p1.x - p0.x) as f64;
        if edge_x > cx {
            winding += dir;
            crossings += 1;
        }
    }
    (winding, crossings % 2 == 1)
}

/// Fills a closed polygon. Non-zero winding when `nonzero`, even-odd
/// otherwise. Returns the touched bounding box.
pub(super) fn fill_polygon(
    img: &mut Image,
    points: &[Point],
    nonzero: bool,
    color: [u8; 4],
    op: DrawOp,
) -> Rect {
    let bounds = img.draw_bounds();
    if bounds.is_empty() || points.len() < 3 {
        return Rect::ZERO;
    }
    let mut bbox = Rect::new(points[0].x, points[0].y, points[0].x, points[0].y);
    for p in points {
        bbox.min.x = bbox.min.x.min(p.x);
        bbox.min.y = bbox.min.y.min(p.y);
        bbox.max.x = bbox.max.x.max(p.x + 1);
        bbox.max.y = bbox.max.y.max(p.y + 1);
    }
    let bbox = bbox.intersect(&bounds);

    for y in bbox.min.y..bbox.max.y {
        for x in bbox.min.x..bbox.max.x {
            let (winding, odd) = winding_at(points, x, y);
            let inside = if nonzero { winding != 0 } else { odd };
            if inside {
                plot(img, &bounds, x, y, color, op);
            }
        }
    }
    bbox
}
