// core-draw/tests/support/mod.rs

//! Shared helpers for the integration scenarios: command-buffer
//! builders and a deterministic fallback text driver.

use core_draw::font::TextDriver;
use core_draw::wire::{opcodes, WireWriter};
use draw_gfx::{Channel, DrawOp, Point, Rect, Surface};

/// Fixed advance used by the block driver, pixels per character.
pub const BLOCK_ADVANCE: i32 = 8;

/// A deterministic stand-in for a platform text API: every character
/// becomes a filled rectangle one advance wide and one font height
/// tall, sitting on the baseline.
pub struct BlockTextDriver;

impl TextDriver for BlockTextDriver {
    fn draw_text(
        &self,
        surface: &mut Surface,
        pen: Point,
        text: &str,
        color: [u8; 4],
        font_height: u32,
        _family: &str,
    ) -> anyhow::Result<Point> {
        let mut x = pen.x;
        for _ in text.chars() {
            surface.fill_rect(
                Rect::new(x, pen.y - font_height as i32, x + BLOCK_ADVANCE, pen.y),
                color,
                DrawOp::SoverD,
            );
            x += BLOCK_ADVANCE;
        }
        Ok(Point::new(x, pen.y))
    }
}

pub fn alloc_image(
    w: &mut WireWriter,
    id: i32,
    chan: Channel,
    repl: bool,
    r: Rect,
    clipr: Rect,
    color: u32,
) {
    w.byte(opcodes::ALLOC_IMAGE)
        .long(id)
        .long(0)
        .byte(1)
        .ulong(chan.tag())
        .byte(repl as u8)
        .rect(r)
        .rect(clipr)
        .ulong(color);
}

pub fn draw(w: &mut WireWriter, dst: i32, src: i32, mask: i32, r: Rect, sp: Point, mp: Point) {
    w.byte(opcodes::DRAW)
        .long(dst)
        .long(src)
        .long(mask)
        .rect(r)
        .point(sp)
        .point(mp);
}

pub fn set_op(w: &mut WireWriter, op: DrawOp) {
    w.byte(opcodes::SET_OP).byte(op as u8);
}

pub fn init_font(w: &mut WireWriter, font_id: i32, n: u32, ascent: u8) {
    w.byte(opcodes::INIT_FONT).long(font_id).ulong(n).byte(ascent);
}

#[allow(clippy::too_many_arguments)]
pub fn load_char(
    w: &mut WireWriter,
    font_id: i32,
    src_id: i32,
    index: u16,
    r: Rect,
    p: Point,
    left: i8,
    width: u8,
) {
    w.byte(opcodes::LOAD_CHAR)
        .long(font_id)
        .long(src_id)
        .short(index)
        .rect(r)
        .point(p)
        .byte(left as u8)
        .byte(width);
}

pub fn string(
    w: &mut WireWriter,
    dst: i32,
    src: i32,
    font_id: i32,
    p: Point,
    clipr: Rect,
    sp: Point,
    indices: &[u16],
) {
    w.byte(opcodes::STRING)
        .long(dst)
        .long(src)
        .long(font_id)
        .point(p)
        .rect(clipr)
        .point(sp)
        .short(indices.len() as u16);
    for &i in indices {
        w.short(i);
    }
}

pub fn flush(w: &mut WireWriter) {
    w.byte(opcodes::FLUSH);
}
