// Benchmarks for index construction, ranking, and curation over a synthetic catalog
use assetx_core::{CurationConfig, Curator, Engine, MemoryImages, TabularStore, TermIndex};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand::rngs::StdRng;

const WORDS: [&str; 16] = [
    "chair", "table", "lamp", "desk", "sofa", "bed", "shelf", "mirror",
    "vase", "mug", "bottle", "plant", "clock", "rug", "stool", "cabinet",
];

fn synthetic_table(rows: usize) -> String {
    let mut rng = StdRng::seed_from_u64(7);
    let mut table = String::from("fullId,category,wnlemmas,name,tags\n");
    for i in 0..rows {
        let category = WORDS[rng.random_range(0..WORDS.len())];
        let lemma = WORDS[rng.random_range(0..WORDS.len())];
        let name = format!("{} {}", WORDS[rng.random_range(0..WORDS.len())], i % 97);
        let tag = WORDS[rng.random_range(0..WORDS.len())];
        table.push_str(&format!(
            "wss.{:032x},\"{},Furniture\",{},{},\"{},misc\"\n",
            i, category, lemma, name, tag
        ));
    }
    table
}

fn benchmark_build_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_index");

    for size in [1_000, 10_000, 50_000].iter() {
        let store = TabularStore::from_reader(synthetic_table(*size).as_bytes()).unwrap();
        group.bench_with_input(BenchmarkId::new("rows", size), &store, |b, store| {
            b.iter(|| black_box(TermIndex::build(store)));
        });
    }

    group.finish();
}

fn benchmark_ranked_results(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranked_results");

    let store = TabularStore::from_reader(synthetic_table(10_000).as_bytes()).unwrap();
    let engine = Engine::new(store, MemoryImages::new());

    group.bench_function("popular_term", |b| {
        b.iter(|| black_box(engine.ranked_results(black_box("furniture"))));
    });
    group.bench_function("rare_term", |b| {
        b.iter(|| black_box(engine.ranked_results(black_box("chair 13"))));
    });

    group.finish();
}

fn benchmark_keep_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("keep_set");
    group.sample_size(10);

    let store = TabularStore::from_reader(synthetic_table(10_000).as_bytes()).unwrap();
    let engine = Engine::new(store, MemoryImages::new());
    let curator = Curator::new(&engine, CurationConfig::default()).unwrap();

    group.bench_function("10k_rows", |b| {
        b.iter(|| black_box(curator.keep_set()));
    });

    group.finish();
}

criterion_group!(benches, benchmark_build_index, benchmark_ranked_results, benchmark_keep_set);
criterion_main!(benches);
