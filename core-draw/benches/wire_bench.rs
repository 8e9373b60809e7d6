// core-draw/benches/wire_bench.rs

//! Decoder and dispatch throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use core_draw::wire::{opcodes, WireReader, WireWriter};
use core_draw::{Compositor, Config};
use draw_gfx::{Channel, Point, Rect};

fn delta_coord_round_trip(c: &mut Criterion) {
    let points: Vec<Point> = (0..1024)
        .map(|i| Point::new((i * 31) % 4000 - 2000, (i * 17) % 3000 - 1500))
        .collect();
    let mut w = WireWriter::new();
    w.delta_points(&points);
    let buf = w.into_inner();

    c.bench_function("decode_1024_delta_points", |b| {
        b.iter(|| {
            let mut r = WireReader::new(black_box(&buf));
            black_box(r.delta_points(points.len()).unwrap())
        })
    });
}

fn blit_dispatch(c: &mut Criterion) {
    let mut compositor = Compositor::new(Config {
        width: 256,
        height: 256,
        ..Config::default()
    })
    .unwrap();

    let mut w = WireWriter::new();
    w.byte(opcodes::ALLOC_IMAGE)
        .long(1)
        .long(0)
        .byte(1)
        .ulong(Channel::Xrgb32.tag())
        .byte(1)
        .rect(Rect::new(0, 0, 1, 1))
        .rect(Rect::new(0, 0, 1, 1))
        .ulong(0xFF3366CC);
    compositor.process(&w.into_inner()).unwrap();

    let mut w = WireWriter::new();
    for i in 0..16 {
        w.byte(opcodes::DRAW)
            .long(0)
            .long(1)
            .long(0)
            .rect(Rect::new(i * 16, 0, i * 16 + 16, 256))
            .point(Point::ZERO)
            .point(Point::ZERO);
    }
    w.byte(opcodes::FLUSH);
    let buf = w.into_inner();

    c.bench_function("process_16_column_blits", |b| {
        b.iter(|| {
            compositor.process(black_box(&buf)).unwrap();
            black_box(compositor.poll_refresh())
        })
    });
}

criterion_group!(benches, delta_coord_round_trip, blit_dispatch);
criterion_main!(benches);
