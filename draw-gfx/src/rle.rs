// draw-gfx/src/rle.rs

//! The Plan 9 image run-length codec.
//!
//! The compressed stream is a sequence of commands. A command byte `c`
//! at or above 128 is followed by `1 + c - 128` literal bytes; below 128
//! it is followed by a single byte repeated `1 + c` times. Decoding
//! stops once the destination is full; trailing input is permitted and
//! left untouched.

use thiserror::Error;

/// Longest run either command form can express.
const MAX_RUN: usize = 128;
/// Literal-run command bias.
const LITERAL_BASE: usize = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RleError {
    #[error("compressed stream truncated mid-command")]
    Truncated,
}

/// Decompresses until `dst_len` bytes have been produced.
///
/// Returns the decompressed bytes and the number of input bytes
/// consumed. A command that would overrun the destination is clamped;
/// its input bytes still count as consumed.
pub fn decompress(src: &[u8], dst_len: usize) -> Result<(Vec<u8>, usize), RleError> {
    let mut out = Vec::with_capacity(dst_len);
    let mut pos = 0usize;
    while out.len() < dst_len {
        let Some(&cmd) = src.get(pos) else {
            return Err(RleError::Truncated);
        };
        pos += 1;
        if cmd as usize >= LITERAL_BASE {
            let n = 1 + cmd as usize - LITERAL_BASE;
            let Some(lit) = src.get(pos..pos + n) else {
                return Err(RleError::Truncated);
            };
            pos += n;
            let take = n.min(dst_len - out.len());
            out.extend_from_slice(&lit[..take]);
        } else {
            let n = 1 + cmd as usize;
            let Some(&v) = src.get(pos) else {
                return Err(RleError::Truncated);
            };
            pos += 1;
            let take = n.min(dst_len - out.len());
            out.resize(out.len() + take, v);
        }
    }
    Ok((out, pos))
}

/// Compresses a byte slice. Runs of three or more identical bytes become
/// repeat commands; everything else is emitted as literal runs. Any
/// decoder-legal policy would do; this one is what the tests pin down.
#[must_use]
pub fn compress(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len() / 2 + 8);
    let mut i = 0usize;
    while i < src.len() {
        // Measure the repeat run starting here.
        let mut run = 1usize;
        while run < MAX_RUN && i + run < src.len() && src[i + run] == src[i] {
            run += 1;
        }
        if run >= 3 {
            out.push((run - 1) as u8);
            out.push(src[i]);
            i += run;
            continue;
        }
        // Literal run: scan forward until a worthwhile repeat begins.
        let start = i;
        while i < src.len() && i - start < MAX_RUN {
            let remaining = &src[i..];
            if remaining.len() >= 3 && remaining[0] == remaining[1] && remaining[1] == remaining[2]
            {
                break;
            }
            i += 1;
        }
        out.push((LITERAL_BASE + (i - start) - 1) as u8);
        out.extend_from_slice(&src[start..i]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_the_documented_example() {
        // command 0x02: three copies of 0x7F; command 0x81: two literals.
        let src = [0x02, 0x7F, 0x81, 0xAB, 0xCD];
        let (out, consumed) = decompress(&src, 5).unwrap();
        assert_eq!(out, vec![0x7F, 0x7F, 0x7F, 0xAB, 0xCD]);
        assert_eq!(consumed, 5);
    }

    #[test]
    fn trailing_input_is_permitted() {
        let src = [0x00, 0x42, 0xEE, 0xEE];
        let (out, consumed) = decompress(&src, 1).unwrap();
        assert_eq!(out, vec![0x42]);
        assert_eq!(consumed, 2);
    }

    #[test]
    fn truncated_literal_run_errors() {
        assert_eq!(decompress(&[0x82, 0x01], 3), Err(RleError::Truncated));
        assert_eq!(decompress(&[0x05], 6), Err(RleError::Truncated));
        assert_eq!(decompress(&[], 1), Err(RleError::Truncated));
    }

    #[test]
    fn overlong_command_is_clamped_to_destination() {
        // A 16-byte repeat against a 4-byte destination.
        let (out, consumed) = decompress(&[0x0F, 0x99], 4).unwrap();
        assert_eq!(out, vec![0x99; 4]);
        assert_eq!(consumed, 2);
    }

    #[test]
    fn round_trips_assorted_inputs() {
        let cases: &[&[u8]] = &[
            b"",
            b"a",
            b"ab",
            b"aaab",
            b"abcabcabc",
            &[0u8; 1000],
            &[1, 1, 2, 2, 3, 3, 3, 3, 4],
        ];
        for &case in cases {
            let packed = compress(case);
            let (unpacked, consumed) = decompress(&packed, case.len()).unwrap();
            assert_eq!(unpacked, case);
            assert_eq!(consumed, packed.len());
        }
    }

    #[test]
    fn round_trips_a_long_mixed_buffer() {
        let mut buf = Vec::new();
        for i in 0..4096u32 {
            // Mix of short runs and noise, deterministic.
            buf.push((i * 7 + i / 13) as u8);
            if i % 5 == 0 {
                buf.extend_from_slice(&[9, 9, 9, 9]);
            }
        }
        let packed = compress(&buf);
        let (unpacked, _) = decompress(&packed, buf.len()).unwrap();
        assert_eq!(unpacked, buf);
    }

    #[test]
    fn long_runs_split_at_the_command_limit() {
        let buf = vec![7u8; 300];
        let packed = compress(&buf);
        // 128 + 128 + 44 => three repeat commands.
        assert_eq!(packed, vec![127, 7, 127, 7, 43, 7]);
    }
}
