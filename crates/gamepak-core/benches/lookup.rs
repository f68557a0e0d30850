//! Catalog lookup benchmarks.
//!
//! Measures path and id resolution on large catalogs and the cost of
//! crossing into a nested container.

#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use gamepak_core::ArchiveBuilder;
use gamepak_core::ArchiveContext;
use gamepak_core::Catalog;
use gamepak_core::CatalogEntry;
use gamepak_core::EntryKey;
use gamepak_core::address::normalize_path;
use gamepak_core::test_utils::nested_tar_fixture;
use std::hint::black_box;
use std::sync::Arc;

fn catalog(size: usize) -> Catalog {
    let mut catalog = Catalog::new();
    for i in 0..size {
        let path = format!("textures/set{}/tile{i}.dds", i % 32);
        catalog.push(CatalogEntry::new(&path).with_id(i as u64));
    }
    catalog.rebuild_indexes(true);
    catalog
}

fn benchmark_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_lookup");
    for size in [1_000, 100_000] {
        let catalog = catalog(size);
        let middle = size / 2 - (size / 2) % 32 + 7;
        let path = EntryKey::from(format!("textures/set7/tile{middle}.dds"));
        let id = EntryKey::from((size / 2) as u64);

        group.bench_with_input(BenchmarkId::new("by_path", size), &path, |b, key| {
            b.iter(|| catalog.resolve_one(black_box(key)));
        });
        group.bench_with_input(BenchmarkId::new("by_id", size), &id, |b, key| {
            b.iter(|| catalog.resolve_one(black_box(key)));
        });
    }
    group.finish();
}

fn benchmark_normalize(c: &mut Criterion) {
    c.bench_function("normalize_path", |b| {
        b.iter(|| normalize_path(black_box("\\Data//textures/./walls/brick01.dds/")));
    });
}

fn benchmark_nested(c: &mut Criterion) {
    let archive = ArchiveBuilder::new(Arc::new(ArchiveContext::default()))
        .bytes("outer.tar", nested_tar_fixture())
        .build()
        .unwrap();
    archive.open().unwrap();
    archive.get_entry("sub.tar:inner/file.txt").unwrap();

    c.bench_function("nested_lookup", |b| {
        b.iter(|| archive.get_entry(black_box("sub.tar:inner/file.txt")));
    });
}

criterion_group!(benches, benchmark_lookup, benchmark_normalize, benchmark_nested);
criterion_main!(benches);
