// core-draw/src/wire/ctl.rs

//! Fixed-size out-of-band records.
//!
//! The ctl record describes one image as twelve 12-character ASCII
//! fields, each value right-justified in 11 columns and followed by a
//! space. The refresh record is four little-endian `i32`s bounding the
//! pixels that changed since the last flush.

use draw_gfx::{Channel, Rect};

/// Size of a ctl record in bytes.
pub const CTL_RECORD_LEN: usize = 144;
/// Size of a refresh record in bytes.
pub const REFRESH_RECORD_LEN: usize = 16;

fn push_field(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(format!("{value:>11} ").as_bytes());
}

/// Builds the 144-byte ctl record for an image.
#[must_use]
pub fn ctl_record(
    client_id: i32,
    image_id: i32,
    chan: Channel,
    repl: bool,
    r: Rect,
    clipr: Rect,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(CTL_RECORD_LEN);
    push_field(&mut out, &client_id.to_string());
    push_field(&mut out, &image_id.to_string());
    push_field(&mut out, chan.token());
    push_field(&mut out, if repl { "1" } else { "0" });
    for v in [r.min.x, r.min.y, r.max.x, r.max.y] {
        push_field(&mut out, &v.to_string());
    }
    for v in [clipr.min.x, clipr.min.y, clipr.max.x, clipr.max.y] {
        push_field(&mut out, &v.to_string());
    }
    debug_assert_eq!(out.len(), CTL_RECORD_LEN);
    out
}

/// Encodes a refresh rectangle as four little-endian `i32`s.
#[must_use]
pub fn refresh_record(r: Rect) -> [u8; REFRESH_RECORD_LEN] {
    let mut out = [0u8; REFRESH_RECORD_LEN];
    out[0..4].copy_from_slice(&r.min.x.to_le_bytes());
    out[4..8].copy_from_slice(&r.min.y.to_le_bytes());
    out[8..12].copy_from_slice(&r.max.x.to_le_bytes());
    out[12..16].copy_from_slice(&r.max.y.to_le_bytes());
    out
}
