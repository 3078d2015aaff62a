//! Criterion benchmarks for the title codecs.
//!
//! The sanitizer and the disc-title codec run on every rename, so they sit
//! on the UI's critical path between a keystroke and a device write.
//!
//! Run with:
//! ```bash
//! cargo bench --package md-core --bench title_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use md_core::{decode_disc_title, encode_disc_title, sanitize_title};

fn bench_sanitize(c: &mut Criterion) {
    let ascii = "A perfectly ordinary mixtape title 01";
    let accented = "Thème de Café — Études für Ärzte";

    c.bench_function("sanitize/ascii", |b| {
        b.iter(|| sanitize_title(black_box(ascii)))
    });
    c.bench_function("sanitize/accented", |b| {
        b.iter(|| sanitize_title(black_box(accented)))
    });
}

fn bench_group_codec(c: &mut Criterion) {
    let plain = "Greatest Hits";
    let grouped = "0;Mix//Rock Classics//Jazz Standards//Live Bootlegs";

    c.bench_function("group/decode_plain", |b| {
        b.iter(|| decode_disc_title(black_box(plain)))
    });
    c.bench_function("group/decode_grouped", |b| {
        b.iter(|| decode_disc_title(black_box(grouped)))
    });
    c.bench_function("group/roundtrip_grouped", |b| {
        b.iter(|| {
            let d = decode_disc_title(black_box(grouped));
            encode_disc_title(&d.display_title, &d).unwrap()
        })
    });
}

criterion_group!(benches, bench_sanitize, bench_group_codec);
criterion_main!(benches);
