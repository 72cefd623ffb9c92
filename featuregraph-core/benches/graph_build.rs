//! Graph construction and planning benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use featuregraph_core::{graph, BoxError, Feature, Table};

fn passthrough(table: &Table) -> Result<Table, BoxError> {
    Ok(table.clone())
}

/// `depth` layers of `width` features, each depending on every feature of
/// the layer below. Every layer is a stack of diamonds.
fn layered(depth: usize, width: usize) -> Feature<Table> {
    let mut layer: Vec<Feature<Table>> = (0..width)
        .map(|i| Feature::column(format!("c{i}")))
        .collect();

    for level in 0..depth {
        layer = (0..width)
            .map(|i| {
                layer
                    .iter()
                    .fold(Feature::builder(format!("f{level}_{i}")), |builder, dependency| {
                        builder.depends_on(dependency.name(), dependency)
                    })
                    .compute(passthrough)
                    .build()
                    .expect("benchmark feature has compute logic")
            })
            .collect();
    }

    layer
        .iter()
        .fold(Feature::builder("top"), |builder, dependency| {
            builder.depends_on(dependency.name(), dependency)
        })
        .compute(passthrough)
        .build()
        .expect("benchmark feature has compute logic")
}

fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph");

    for &(depth, width) in &[(4, 4), (16, 8), (64, 8)] {
        let top = layered(depth, width);
        let id = format!("{depth}x{width}");

        group.bench_with_input(BenchmarkId::new("build", &id), &top, |b, top| {
            b.iter(|| graph::build(black_box(top)))
        });
        group.bench_with_input(BenchmarkId::new("assert_acyclic", &id), &top, |b, top| {
            b.iter(|| graph::assert_acyclic(black_box(top)))
        });
        group.bench_with_input(BenchmarkId::new("plan", &id), &top, |b, top| {
            b.iter(|| graph::plan(black_box(std::slice::from_ref(top))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_graph);
criterion_main!(benches);
