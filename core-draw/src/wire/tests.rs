// core-draw/src/wire/tests.rs

//! Tests for the wire reader/writer pair and the record formats.

use super::{ctl, WireReader, WireWriter};
use crate::error::DrawError;
use draw_gfx::{Channel, Point, Rect};
use test_log::test;

#[test]
fn it_should_read_scalars_little_endian() {
    let buf = [0x01, 0x34, 0x12, 0xFE, 0xFF, 0xFF, 0xFF];
    let mut r = WireReader::new(&buf);
    assert_eq!(r.byte().unwrap(), 0x01);
    assert_eq!(r.short().unwrap(), 0x1234);
    assert_eq!(r.long().unwrap(), -2);
    assert!(r.is_empty());
}

#[test]
fn it_should_read_points_and_rects() {
    let mut w = WireWriter::new();
    w.rect(Rect::new(-1, 2, 3, 4));
    let buf = w.into_inner();
    let mut r = WireReader::new(&buf);
    assert_eq!(r.rect().unwrap(), Rect::new(-1, 2, 3, 4));
}

#[test]
fn it_should_fail_on_truncated_reads() {
    let mut r = WireReader::new(&[0x01, 0x02]);
    let err = r.long().unwrap_err();
    assert!(matches!(err, DrawError::MalformedStream(_)));
}

#[test]
fn it_should_read_length_prefixed_strings() {
    let mut w = WireWriter::new();
    w.string("screen.1");
    let buf = w.into_inner();
    let mut r = WireReader::new(&buf);
    assert_eq!(r.string().unwrap(), "screen.1");
}

#[test]
fn it_should_reject_non_utf8_names() {
    let buf = [2, 0xFF, 0xFE];
    let mut r = WireReader::new(&buf);
    assert!(matches!(
        r.string().unwrap_err(),
        DrawError::MalformedStream(_)
    ));
}

#[test]
fn it_should_round_trip_delta_coordinates() {
    // Mixes short deltas, out-of-range jumps and repeated points.
    let points = vec![
        Point::new(0, 0),
        Point::new(63, 0),
        Point::new(-70, 100),
        Point::new(-70, 100),
    ];
    let mut w = WireWriter::new();
    w.delta_points(&points);
    let buf = w.into_inner();
    let mut r = WireReader::new(&buf);
    assert_eq!(r.delta_points(points.len()).unwrap(), points);
    assert!(r.is_empty());
}

#[test]
fn it_should_round_trip_i23_extremes() {
    let points = vec![
        Point::new(-(1 << 22), (1 << 22) - 1),
        Point::new((1 << 22) - 1, -(1 << 22)),
        Point::new(0, 0),
    ];
    let mut w = WireWriter::new();
    w.delta_points(&points);
    let buf = w.into_inner();
    let mut r = WireReader::new(&buf);
    assert_eq!(r.delta_points(points.len()).unwrap(), points);
}

#[test]
fn it_should_sign_extend_the_absolute_form() {
    // -70 absolute: low 7 bits | 0x80, then bits 7..22.
    let v = -70i32;
    let b0 = 0x80 | (v & 0x7F) as u8;
    let b1 = (v >> 7) as u8;
    let b2 = (v >> 15) as u8;
    let buf = [b0, b1, b2];
    let mut r = WireReader::new(&buf);
    assert_eq!(r.delta_coord(0).unwrap(), -70);
}

#[test]
fn it_should_keep_independent_axis_seeds() {
    // x walks 10, 20; y stays on its own accumulator 5, 5.
    let points = vec![Point::new(10, 5), Point::new(20, 5)];
    let mut w = WireWriter::new();
    w.delta_points(&points);
    let buf = w.into_inner();
    // All four coordinates fit the short form: 10, 5, +10, +0.
    assert_eq!(buf.len(), 4);
    let mut r = WireReader::new(&buf);
    assert_eq!(r.delta_points(2).unwrap(), points);
}

#[test]
fn it_should_error_on_truncated_delta_runs() {
    let buf = [0x80, 0x01]; // absolute form missing its third byte
    let mut r = WireReader::new(&buf);
    assert!(matches!(
        r.delta_coord(0).unwrap_err(),
        DrawError::MalformedStream(_)
    ));
}

#[test]
fn ctl_record_is_exactly_144_bytes() {
    let rec = ctl::ctl_record(
        1,
        0,
        Channel::Xrgb32,
        false,
        Rect::new(0, 0, 800, 600),
        Rect::new(0, 0, 800, 600),
    );
    assert_eq!(rec.len(), ctl::CTL_RECORD_LEN);
    let text = std::str::from_utf8(&rec).unwrap();
    assert!(text.contains("x8r8g8b8"));
    // Every field is space-terminated.
    assert!(text.ends_with(' '));
    // Fields split back into twelve values.
    assert_eq!(text.split_whitespace().count(), 12);
}

#[test]
fn refresh_record_encodes_four_le_longs() {
    let rec = ctl::refresh_record(Rect::new(1, 2, 3, -4));
    assert_eq!(rec.len(), ctl::REFRESH_RECORD_LEN);
    assert_eq!(&rec[0..4], &1i32.to_le_bytes());
    assert_eq!(&rec[12..16], &(-4i32).to_le_bytes());
}
