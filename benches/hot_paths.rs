//! Hot path benchmarks for the provider pipeline.
//!
//! Run with: `cargo bench --bench hot_paths`
//! Compare baselines: `cargo bench --bench hot_paths -- --baseline main`
//!
//! Per-request cost is dominated by corpus generation and the per-record
//! codec round trip; matching and wire encoding follow.

use book_search::catalog::{codec, AuthorMatcher, Book, CorpusGenerator, SearchIter};
use book_search::wire;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

fn sample_book() -> Book {
    Book::new(123_456, "Книга №123456", "Достоевский Ф.М.", "Роман", 1866, 543.21)
}

/// Corpus generation at several sizes
fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    for size in [1_000usize, 10_000, 100_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| CorpusGenerator::new(42, size).generate().unwrap())
        });
    }
    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Elements(1));
    let book = sample_book();
    let line = codec::encode(&book);

    group.bench_function("encode", |b| b.iter(|| codec::encode(black_box(&book))));
    group.bench_function("decode", |b| b.iter(|| codec::decode(black_box(&line)).unwrap()));
    group.bench_function("round_trip", |b| {
        b.iter(|| codec::round_trip(black_box(&book)).unwrap())
    });
    group.finish();
}

fn bench_matcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("matcher");
    group.throughput(Throughput::Elements(1));

    let hit = AuthorMatcher::new("ДОСТОЕВСКИЙ");
    let miss = AuthorMatcher::new("Несуществующий Автор");
    group.bench_function("hit", |b| b.iter(|| hit.matches(black_box("Достоевский Ф.М."))));
    group.bench_function("miss", |b| b.iter(|| miss.matches(black_box("Достоевский Ф.М."))));
    group.finish();
}

fn bench_wire(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire");
    group.throughput(Throughput::Elements(1));
    let book = sample_book();
    let frame = wire::encode_book(&book);
    let line = std::str::from_utf8(&frame).unwrap().trim_end().to_string();

    group.bench_function("encode_book", |b| {
        b.iter(|| wire::encode_book(black_box(&book)))
    });
    group.bench_function("decode_line", |b| {
        b.iter(|| wire::decode_line(black_box(&line)).unwrap())
    });
    group.finish();
}

/// Full scan over a pre-generated corpus: round trip and match every record
fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    let corpus = Arc::new(CorpusGenerator::new(42, 100_000).generate().unwrap());
    group.throughput(Throughput::Elements(corpus.len() as u64));

    for query in ["Толстой", "ов", "Несуществующий Автор"] {
        group.bench_with_input(BenchmarkId::from_parameter(query), &query, |b, &query| {
            b.iter(|| SearchIter::new(corpus.clone(), query).count())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_generate,
    bench_codec,
    bench_matcher,
    bench_wire,
    bench_scan,
);

criterion_main!(benches);
