//! Benchmarks for both conversion directions.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use texbridge::{compile_html, compile_markup, html_to_markup, render_markup};

const SAMPLE: &str = include_str!("../tests/fixtures/sample.tex");

fn bench_forward(c: &mut Criterion) {
    c.bench_function("compile_markup", |b| {
        b.iter(|| compile_markup(black_box(SAMPLE)))
    });
}

fn bench_backward(c: &mut Criterion) {
    let html = compile_markup(SAMPLE).html;

    c.bench_function("compile_html", |b| b.iter(|| compile_html(black_box(&html))));
    c.bench_function("html_to_markup", |b| {
        b.iter(|| html_to_markup(black_box(&html)))
    });
}

fn bench_roundtrip(c: &mut Criterion) {
    c.bench_function("roundtrip", |b| {
        b.iter(|| render_markup(&compile_markup(black_box(SAMPLE)).document))
    });
}

criterion_group!(benches, bench_forward, bench_backward, bench_roundtrip);
criterion_main!(benches);
