//! Criterion benchmarks for the CPU keyword distance path
//!
//! - Relaxation of a single keyword row (V passes over E edges)
//! - Full matrix on the worker pool, by thread count
//! - Edge-list snapshot and forward CSR construction

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use keyword_distance::algorithms::{relax_keyword, EdgeList, GraphSnapshot, KeywordBitmap};
use keyword_distance::{CpuBackend, ProgressTracker, ResultMatrix, SparseGraph};
use std::hint::black_box;

/// Generate a random keyword graph (LCG for reproducibility)
fn generate_keyword_graph(
    num_vertices: usize,
    edges_per_vertex: usize,
    keyword_count: usize,
) -> SparseGraph<u32> {
    let mut graph = SparseGraph::with_keyword_count(keyword_count);
    for v in 0..num_vertices as u32 {
        graph.add_vertex(v).unwrap();
    }

    let mut rng_state = 12345_u64;
    let mut next = |bound: usize| {
        rng_state = rng_state.wrapping_mul(1_103_515_245).wrapping_add(12345);
        ((rng_state >> 16) % bound as u64) as u32
    };

    for v in 0..num_vertices as u32 {
        for _ in 0..edges_per_vertex {
            let target = next(num_vertices);
            let weight = next(10) + 1;
            graph.add_edge(v, target, weight).unwrap();
        }
    }
    for k in 0..keyword_count as u32 {
        for _ in 0..3 {
            let holder = next(num_vertices);
            graph.add_keyword(holder, k).unwrap();
        }
    }

    graph
}

/// Benchmark: one keyword row
fn bench_relax_keyword(c: &mut Criterion) {
    let mut group = c.benchmark_group("relax_keyword");

    for size in [30, 100, 500, 1000].iter() {
        let graph = generate_keyword_graph(*size, 3, 1);
        let snapshot = GraphSnapshot::from_graph(&graph);
        let bitmap = KeywordBitmap::from_snapshot(&snapshot, 0..1);

        group.bench_with_input(BenchmarkId::from_parameter(size), &snapshot, |b, snapshot| {
            b.iter(|| {
                let row = relax_keyword(black_box(snapshot.edges()), black_box(&bitmap), 0);
                black_box(row);
            });
        });
    }

    group.finish();
}

/// Benchmark: full matrix on the CPU pool
fn bench_cpu_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_matrix");
    group.sample_size(10);

    let graph = generate_keyword_graph(500, 3, 32);
    let snapshot = GraphSnapshot::from_graph(&graph);

    for threads in [1, 2, 4, 8].iter() {
        let backend = CpuBackend::new(*threads).unwrap();

        group.bench_with_input(BenchmarkId::new("threads", threads), &backend, |b, backend| {
            b.iter(|| {
                let matrix = ResultMatrix::new(snapshot.keyword_count(), snapshot.num_vertices());
                backend
                    .compute_blocking(black_box(&snapshot), &matrix, &ProgressTracker::silent(0))
                    .unwrap();
                black_box(matrix);
            });
        });
    }

    group.finish();
}

/// Benchmark: snapshot extraction and forward CSR
fn bench_edge_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("edge_list");

    for size in [100, 1000, 5000].iter() {
        let graph = generate_keyword_graph(*size, 3, 10);

        group.bench_with_input(BenchmarkId::new("from_graph", size), &graph, |b, graph| {
            b.iter(|| black_box(EdgeList::from_graph(black_box(graph))));
        });

        let edges = graph.edge_list();
        group.bench_with_input(BenchmarkId::new("outgoing", size), &edges, |b, edges| {
            b.iter(|| black_box(edges.outgoing()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_relax_keyword, bench_cpu_matrix, bench_edge_list);
criterion_main!(benches);
