use criterion::{black_box, criterion_group, criterion_main, Criterion};
use decision_graph::encoder::Encoder;
use decision_graph::selector::Selector;
use decision_graph::{Column, ColumnSpec, Dataset, DecisionGraph, GraphBuilder, GraphConfig, Table};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

fn synthetic(n: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(0);
    let mut colour = Vec::with_capacity(n);
    let mut shape = Vec::with_capacity(n);
    let mut size = Vec::with_capacity(n);
    let mut weight = Vec::with_capacity(n);
    let mut label = Vec::with_capacity(n);
    for _ in 0..n {
        let c: u32 = rng.gen_range(0..4);
        let s: u32 = rng.gen_range(0..3);
        let x: f64 = rng.gen_range(0.0..10.0);
        let w: f64 = rng.gen_range(0.0..1.0);
        let mut l = if (c < 2 && x > 4.0) || (c >= 2 && s == 1) { 1 } else { 0 };
        if rng.gen_bool(0.1) {
            l = 1 - l;
        }
        colour.push(c);
        shape.push(s);
        size.push(x);
        weight.push(w);
        label.push(l);
    }
    let specs = vec![
        ColumnSpec::categorical("colour", ["red", "green", "blue", "black"]),
        ColumnSpec::categorical("shape", ["round", "square", "flat"]),
        ColumnSpec::numeric("size"),
        ColumnSpec::numeric("weight"),
        ColumnSpec::categorical("label", ["neg", "pos"]),
    ];
    let columns = vec![
        Column::Categorical(colour),
        Column::Categorical(shape),
        Column::Numeric(size),
        Column::Numeric(weight),
        Column::Categorical(label),
    ];
    Dataset::new(Table::new(specs, columns, "label").unwrap())
}

pub fn graph_benchmarks(c: &mut Criterion) {
    let data = synthetic(2000);
    let cfg = GraphConfig {
        max_join_nodes: 8,
        join_search_timeout: Some(1.0),
        ..Default::default()
    };
    let encoder = Encoder::new(cfg.alpha, 2);

    c.bench_function("Best Split", |b| {
        b.iter(|| {
            let mut graph = DecisionGraph::new(data.clone());
            let mut selector = Selector::new(&encoder, &cfg);
            selector.best_split(black_box(&mut graph))
        })
    });

    let graph = GraphBuilder::new(cfg.clone()).unwrap().fit(&data).unwrap();
    println!("{}", graph.len());
    c.bench_function("Global Length", |b| b.iter(|| encoder.global_length(black_box(&graph))));
    c.bench_function("Graph Predict (Single Threaded)", |b| {
        b.iter(|| graph.predict(black_box(&data), black_box(false)))
    });
    c.bench_function("Graph Predict (Multi Threaded)", |b| {
        b.iter(|| graph.predict(black_box(&data), black_box(true)))
    });

    let mut graph_train = c.benchmark_group("fit_graph");
    graph_train.warm_up_time(Duration::from_secs(5));
    graph_train.sample_size(20);
    graph_train.bench_function("fit_graph_default", |b| {
        b.iter(|| GraphBuilder::new(cfg.clone()).unwrap().fit(black_box(&data)).unwrap())
    });
    graph_train.bench_function("fit_graph_without_joins", |b| {
        b.iter(|| {
            GraphBuilder::new(cfg.clone()).unwrap()
                .set_allow_joins(false)
                .fit(black_box(&data))
                .unwrap()
        })
    });
    graph_train.finish();
}

criterion_group!(benches, graph_benchmarks);
criterion_main!(benches);
