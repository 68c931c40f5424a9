//! Benchmarks for catalog loading and statement inspection.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use starbuild::catalog::StageCatalog;
use starbuild::core::{fingerprint, StageName};
use starbuild::query::manipulates_database;

fn catalog_benchmark(c: &mut Criterion) {
    c.bench_function("catalog_embedded_load", |b| {
        b.iter(|| black_box(StageCatalog::embedded()))
    });

    let catalog = StageCatalog::embedded().unwrap_or_default();
    let fact = catalog
        .statements(StageName::Facts)
        .first()
        .map(|s| s.text.clone())
        .unwrap_or_default();

    c.bench_function("manipulates_database_long_statement", |b| {
        b.iter(|| black_box(manipulates_database(black_box(&fact))))
    });

    c.bench_function("statement_fingerprint", |b| {
        b.iter(|| black_box(fingerprint(black_box(&fact))))
    });
}

criterion_group!(benches, catalog_benchmark);
criterion_main!(benches);
