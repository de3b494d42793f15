//! Benchmarks for skein-cache.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::Value;
use skein_cache::SuspenseCache;
use skein_core::{Document, Variables};
use skein_reactive::ManualObservableQuery;
use std::convert::Infallible;

fn variables(size: usize) -> Variables {
    (0..size)
        .map(|i| (format!("var{i}"), Value::from(i as u64)))
        .collect()
}

fn watch(doc: &Document) -> Result<ManualObservableQuery<Value>, Infallible> {
    Ok(ManualObservableQuery::loading(doc.clone()))
}

fn bench_cache_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_hit");
    let doc = Document::parse("query Search { search { id } }").unwrap();

    for size in [0, 4, 16, 64] {
        let cache = SuspenseCache::new(());
        let vars = variables(size);
        cache.get_subscription(&doc, Some(&vars), |_| watch(&doc)).unwrap();

        group.bench_with_input(BenchmarkId::new("get_subscription", size), &vars, |b, vars| {
            b.iter(|| {
                cache
                    .get_subscription(&doc, Some(black_box(vars)), |_| watch(&doc))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_create_and_dispose(c: &mut Criterion) {
    let doc = Document::parse("query Search { search { id } }").unwrap();
    let cache = SuspenseCache::new(());
    let vars = variables(4);

    c.bench_function("create_and_dispose", |b| {
        b.iter(|| {
            let subscription = cache.get_subscription(&doc, Some(&vars), |_| watch(&doc)).unwrap();
            subscription.dispose();
        })
    });
}

criterion_group!(benches, bench_cache_hit, bench_create_and_dispose);
criterion_main!(benches);
