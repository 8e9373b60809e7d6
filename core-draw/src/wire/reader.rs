// core-draw/src/wire/reader.rs

//! The decoding cursor.

use crate::error::{DrawError, Result};
use draw_gfx::{Point, Rect};
use log::trace;

// Delta coordinates: a clear top bit is a signed 7-bit delta against the
// running value; a set top bit starts a 3-byte signed 23-bit absolute.
const DELTA_ABSOLUTE: u8 = 0x80;
const DELTA_PAYLOAD: u8 = 0x7F;
// Shift that parks bit 22 in the sign position of an i32.
const ABS_SIGN_SHIFT: u32 = 9;
// Same idea for the 7-bit form and an i8.
const DELTA_SIGN_SHIFT: u32 = 1;

/// A stateful, non-allocating cursor over one command buffer.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        WireReader { buf, pos: 0 }
    }

    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Takes `n` raw bytes.
    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        match self.buf.get(self.pos..self.pos + n) {
            Some(s) => {
                self.pos += n;
                Ok(s)
            }
            None => Err(DrawError::MalformedStream(format!(
                "needed {n} bytes at offset {}, buffer holds {}",
                self.pos,
                self.buf.len()
            ))),
        }
    }

    /// Takes everything up to the end of the buffer.
    pub fn take_rest(&mut self) -> &'a [u8] {
        let rest = &self.buf[self.pos..];
        self.pos = self.buf.len();
        rest
    }

    pub fn byte(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub fn short(&mut self) -> Result<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn long(&mut self) -> Result<i32> {
        let b = self.bytes(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn ulong(&mut self) -> Result<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn point(&mut self) -> Result<Point> {
        Ok(Point::new(self.long()?, self.long()?))
    }

    pub fn rect(&mut self) -> Result<Rect> {
        Ok(Rect::from_points(self.point()?, self.point()?))
    }

    /// A 1-byte-length-prefixed UTF-8 string.
    pub fn string(&mut self) -> Result<&'a str> {
        let len = self.byte()? as usize;
        let raw = self.bytes(len)?;
        std::str::from_utf8(raw)
            .map_err(|_| DrawError::MalformedStream("name is not valid UTF-8".to_string()))
    }

    /// One delta-compressed coordinate against the previous value for
    /// its axis.
    pub fn delta_coord(&mut self, prev: i32) -> Result<i32> {
        let b0 = self.byte()?;
        if b0 & DELTA_ABSOLUTE == 0 {
            let delta = (((b0 << DELTA_SIGN_SHIFT) as i8) >> DELTA_SIGN_SHIFT) as i32;
            Ok(prev.wrapping_add(delta))
        } else {
            let b1 = self.byte()?;
            let b2 = self.byte()?;
            let v = (b0 & DELTA_PAYLOAD) as u32 | (b1 as u32) << 7 | (b2 as u32) << 15;
            Ok(((v << ABS_SIGN_SHIFT) as i32) >> ABS_SIGN_SHIFT)
        }
    }

    /// Reads `n` delta-compressed points. The x and y axes run
    /// independent accumulators, both seeded from zero.
    pub fn delta_points(&mut self, n: usize) -> Result<Vec<Point>> {
        let mut points = Vec::with_capacity(n);
        let mut prev_x = 0i32;
        let mut prev_y = 0i32;
        for _ in 0..n {
            prev_x = self.delta_coord(prev_x)?;
            prev_y = self.delta_coord(prev_y)?;
            points.push(Point::new(prev_x, prev_y));
        }
        trace!("decoded {n} polygon points");
        Ok(points)
    }
}
